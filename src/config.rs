//! Runtime configuration (§3.1, §6.3).
//!
//! [`Config`] mirrors the recognized options one field at a time, with
//! defaults matching the spec; [`ConfigBuilder`] offers fluent setters for
//! embedders that don't want to build the struct literal by hand.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_DOOR_NAME, DEFAULT_PACKET_TIMEOUT_MS};
use crate::error::HcpError;

/// Recognized runtime options for connecting to an HCP1 bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// OS device path for the serial port, e.g. `/dev/ttyUSB0`.
    pub path: String,
    pub baud_rate: u32,
    /// Parser inactivity reset, in milliseconds.
    pub packet_timeout_ms: u64,
    /// Clamp over-long chunks read from the serial port.
    pub filter_max_length: bool,
    /// Drop leading zero bytes that mark sync-breaks at a chunk boundary.
    pub filter_breaks: bool,
    /// Used only in log labels.
    pub door_name: String,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            path: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            packet_timeout_ms: DEFAULT_PACKET_TIMEOUT_MS,
            filter_max_length: true,
            filter_breaks: true,
            door_name: DEFAULT_DOOR_NAME.to_string(),
        }
    }
}

/// Fluent builder for [`Config`]. `path` is the only option without a
/// usable default; [`ConfigBuilder::build`] fails without it.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    inner: Config,
    path_set: bool,
}

impl ConfigBuilder {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = path.into();
        self.path_set = true;
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.inner.baud_rate = baud_rate;
        self
    }

    pub fn packet_timeout_ms(mut self, packet_timeout_ms: u64) -> Self {
        self.inner.packet_timeout_ms = packet_timeout_ms;
        self
    }

    pub fn filter_max_length(mut self, filter_max_length: bool) -> Self {
        self.inner.filter_max_length = filter_max_length;
        self
    }

    pub fn filter_breaks(mut self, filter_breaks: bool) -> Self {
        self.inner.filter_breaks = filter_breaks;
        self
    }

    pub fn door_name(mut self, door_name: impl Into<String>) -> Self {
        self.inner.door_name = door_name.into();
        self
    }

    pub fn build(self) -> Result<Config, HcpError> {
        if !self.path_set || self.inner.path.is_empty() {
            return Err(HcpError::MissingPath);
        }
        Ok(self.inner)
    }
}
