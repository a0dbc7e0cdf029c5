//! HCP1 wire-level constants.
//!
//! Addresses, command codes, and sizing limits fixed by the protocol (§3,
//! §6.1, §6.2 of the specification).

/// Broadcast address: door/light status frames from the drive to all listeners.
pub const ADDR_BROADCAST: u8 = 0x00;

/// Master address: the drive itself. Responses are always sent as this address.
pub const ADDR_MASTER: u8 = 0x80;

/// UAP1 slave address this client impersonates.
pub const ADDR_UAP1_SLAVE: u8 = 0x28;

/// UAP1 device type byte, returned in the slave-scan response.
pub const UAP1_TYPE: u8 = 0x14;

/// Command byte of a slave-scan request payload.
pub const CMD_SLAVE_SCAN: u8 = 0x01;
/// Who-from byte expected in a slave-scan request (master).
pub const SLAVE_SCAN_WHO_FROM_MASTER: u8 = 0x80;

/// Command byte of a slave-status-request payload.
pub const CMD_SLAVE_STATUS_REQUEST: u8 = 0x20;

/// Command byte prefixed to every slave-status response payload.
pub const RESP_SLAVE_STATUS: u8 = 0x29;

/// Mode byte value meaning "normal" in a slave-status response.
pub const MODE_NORMAL: u8 = 0x10;
/// Mode byte value meaning "emergency stop" in a slave-status response.
pub const MODE_EMERGENCY_STOP: u8 = 0x00;

/// Minimum wire frame length: address + length byte + CRC, zero payload.
pub const FRAME_MIN_LEN: usize = 4;
/// Maximum wire frame length: address + length byte + 15 payload bytes + CRC.
pub const FRAME_MAX_LEN: usize = 18;
/// Maximum payload length encodable in the length nibble.
pub const MAX_PAYLOAD_LEN: usize = 15;

/// Minimum delay the engine must wait after parsing before writing a response (§4.4).
pub const MIN_RESPONSE_DELAY_MS: u64 = 3;

/// Default serial baud rate for HCP1 (§4.6, §6.3).
pub const DEFAULT_BAUD_RATE: u32 = 19_200;
/// Default parser inactivity timeout (§4.3, §6.3).
pub const DEFAULT_PACKET_TIMEOUT_MS: u64 = 50;
/// Default door name used only in log labels (§6.3).
pub const DEFAULT_DOOR_NAME: &str = "Hörmann Garage Door";
