//! Test doubles (§4.7, §9): a mock serial port for exercising
//! [`crate::serial::SerialAdapter`] without hardware, and a mock [`crate::bus_peer::BusPeer`]
//! for exercising [`crate::client::Hcp1Client`] and the door state machine end to end.

mod mock_peer;
mod mock_serial;

pub use mock_peer::MockBusPeer;
pub use mock_serial::MockSerialPort;
