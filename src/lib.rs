//! # hcp1-uap1 - Hörmann HCP1 client impersonating a UAP1 accessory module
//!
//! Speaks the Hörmann Communication Protocol v1 (HCP1) on the half-duplex
//! RS485 bus of a SupraMatic drive, answering the drive's slave-scan and
//! status-poll cycle as if this process were a UAP1 universal accessory
//! module. This gets an embedder door state, light state, and the ability
//! to request open/close/vent/stop without the drive's own gateway.
//!
//! ## Usage
//!
//! ```no_run
//! use hcp1_uap1::{Config, Hcp1Client, LiveBusPeer, TargetDoorState};
//!
//! # async fn run() -> Result<(), hcp1_uap1::HcpError> {
//! let config = Config::builder().path("/dev/ttyUSB0").build()?;
//! let peer = LiveBusPeer::connect(&config).await?;
//! let mut client = Hcp1Client::new(peer);
//! client.set_target_state(TargetDoorState::Open).await?;
//! # Ok(())
//! # }
//! ```

pub mod bus_peer;
pub mod client;
pub mod config;
pub mod constants;
pub mod crc;
pub mod door;
pub mod error;
pub mod logging;
pub mod packet;
pub mod parser;
pub mod protocol;
pub mod serial;
pub mod testing;
pub mod util;

pub use bus_peer::BusPeer;
pub use client::{Hcp1Client, LiveBusPeer};
pub use config::{Config, ConfigBuilder};
pub use door::{DoorEvent, DoorState, DoorStateMachine, TargetDoorState};
pub use error::HcpError;
pub use logging::{init_logger, log_debug, log_error, log_info, log_warn};
pub use packet::Packet;
pub use parser::{SalvageParser, StrictParser};
pub use protocol::{CommandFlags, EngineEvent, ProtocolEngine};
pub use serial::{ParserKind, SerialAdapter};
