//! Bus peer interface (§4.7, §9).
//!
//! The minimal surface the door state machine needs, implemented both by
//! the live [`crate::client::Hcp1Client`] (serial adapter + protocol engine)
//! and by [`crate::testing::MockBusPeer`]. Each event gets its own `on_*`
//! method rather than a single string-keyed emitter, so registration is
//! checked against a fixed, compile-time set of topics (§9 "dynamic event
//! emitter → typed event bus").

use async_trait::async_trait;

use crate::error::HcpError;
use crate::packet::Packet;
use crate::protocol::CommandFlags;

pub type DataListener = Box<dyn Fn([u8; 2]) + Send + Sync>;
pub type ErrorListener = Box<dyn Fn(HcpError) + Send + Sync>;
pub type InitListener = Box<dyn Fn(Packet) + Send + Sync>;
pub type VoidListener = Box<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait BusPeer: Send + Sync {
    /// Registers a listener for decoded 2-byte broadcast status payloads.
    fn on_data(&mut self, listener: DataListener);
    /// Registers a listener for non-fatal protocol/domain errors.
    fn on_error(&mut self, listener: ErrorListener);
    /// Registers a listener fired once the slave-scan reply completes.
    fn on_init(&mut self, listener: InitListener);
    /// Registers a listener fired when the underlying port opens.
    fn on_open(&mut self, listener: VoidListener);
    /// Registers a listener fired when the underlying port closes.
    fn on_close(&mut self, listener: VoidListener);

    /// Queues a command to be piggybacked onto the next status poll; the
    /// future resolves with the packet actually sent, or rejects with
    /// `PortClosed` if the port closes first.
    async fn push_command(
        &mut self,
        flags: CommandFlags,
        emergency_stop: bool,
    ) -> Result<Packet, HcpError>;
}

/// A small per-topic subscriber list shared by every `BusPeer` implementation.
#[derive(Default)]
pub(crate) struct Subscribers {
    data: Vec<DataListener>,
    error: Vec<ErrorListener>,
    init: Vec<InitListener>,
    open: Vec<VoidListener>,
    close: Vec<VoidListener>,
}

impl Subscribers {
    pub fn on_data(&mut self, listener: DataListener) {
        self.data.push(listener);
    }

    pub fn on_error(&mut self, listener: ErrorListener) {
        self.error.push(listener);
    }

    pub fn on_init(&mut self, listener: InitListener) {
        self.init.push(listener);
    }

    pub fn on_open(&mut self, listener: VoidListener) {
        self.open.push(listener);
    }

    pub fn on_close(&mut self, listener: VoidListener) {
        self.close.push(listener);
    }

    pub fn emit_data(&self, payload: [u8; 2]) {
        for listener in &self.data {
            listener(payload);
        }
    }

    pub fn emit_error(&self, err: HcpError) {
        for listener in &self.error {
            listener(err.clone());
        }
    }

    pub fn emit_init(&self, packet: Packet) {
        for listener in &self.init {
            listener(packet.clone());
        }
    }

    pub fn emit_open(&self) {
        for listener in &self.open {
            listener();
        }
    }

    pub fn emit_close(&self) {
        for listener in &self.close {
            listener();
        }
    }
}
