//! # HCP1 Error Handling
//!
//! This module defines the `HcpError` enum, which represents the different
//! error kinds that can occur across framing, protocol dispatch, door-state
//! decoding, transport, and configuration (§7).

use thiserror::Error;

/// Represents the different error kinds that can occur in the HCP1 crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HcpError {
    // --- Framing (§7.1) ---
    /// Byte slice shorter than `FRAME_MIN_LEN`.
    #[error("packet too short: {len} bytes")]
    TooShort { len: usize },

    /// Byte slice longer than `FRAME_MAX_LEN`.
    #[error("packet too long: {len} bytes")]
    TooLong { len: usize },

    /// CRC-8 over the candidate frame did not match the trailing byte.
    #[error("bad CRC: got 0x{got:02x}, expected 0x{expected:02x}")]
    BadCrc { got: u8, expected: u8 },

    /// The length nibble in the header disagrees with the actual frame length.
    #[error("length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// A broadcast payload was not exactly 2 bytes.
    #[error("bad broadcast payload length: {0}")]
    BadPayloadLen(usize),

    // --- Protocol (§7.2) ---
    /// A packet addressed to our slave address arrived with an unexpected counter.
    #[error("bad counter: expected {expected}, got {got}")]
    BadCounter { expected: u8, got: u8 },

    /// A slave command code this engine does not implement.
    #[error("unknown slave command: 0x{0:02x}")]
    UnknownSlaveCommand(u8),

    /// A slave-scan payload that was not exactly `[0x01, 0x80]`.
    #[error("bad scan payload")]
    BadScanPayload,

    // --- Domain (§7.3) ---
    /// Broadcast status byte 0 did not match any known bit pattern.
    #[error("unknown status")]
    UnknownStatus,

    /// Broadcast status byte 0 had the error_active bit set.
    #[error("error active")]
    ErrorActive,

    /// A getter was called before the corresponding cell was ever set.
    #[error("not initialized")]
    NotInitialized,

    // --- Transport (§7.4) ---
    /// The underlying UART write failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// An operation was attempted after the port was closed.
    #[error("port closed")]
    PortClosed,

    // --- Configuration (ambient, §2.1) ---
    /// `ConfigBuilder::build()` was called without a `path`.
    #[error("missing required `path` option")]
    MissingPath,
}
