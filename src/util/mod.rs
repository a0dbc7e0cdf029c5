//! # Utility Modules
//!
//! Common utility types used throughout the crate: a streaming byte buffer
//! shared by both stream parser variants, and hex formatting helpers used
//! for logging and diagnostics.

pub mod hex;
pub mod iobuffer;

pub use hex::{format_hex_compact, pretty_hex};
pub use iobuffer::{IoBuffer, IoBufferError};
