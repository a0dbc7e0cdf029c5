//! Mock bus peer for exercising [`crate::client::Hcp1Client`] without real
//! hardware (§4.7, §9).
//!
//! Runs in "inference mode": it tracks a simulated door/light state and
//! infers the effect of each pushed command (open/close move the door
//! unless it is already there, venting always applies, toggle-light flips
//! the light), then broadcasts the resulting status the way the drive would.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::bus_peer::{BusPeer, DataListener, ErrorListener, InitListener, Subscribers, VoidListener};
use crate::constants::{ADDR_MASTER, MIN_RESPONSE_DELAY_MS, MODE_EMERGENCY_STOP, MODE_NORMAL, RESP_SLAVE_STATUS};
use crate::error::HcpError;
use crate::packet::Packet;
use crate::protocol::CommandFlags;

/// Wire bit layout mirrored from the broadcast status byte (§3), used here
/// only to synthesize realistic broadcasts for the simulated door.
mod bit {
    pub const DOOR_CLOSED: u8 = 1 << 0;
    pub const DOOR_OPENED: u8 = 1 << 1;
    pub const LIGHT_ON: u8 = 1 << 3;
    pub const DOOR_DIRECTION_CLOSING: u8 = 1 << 5;
    pub const DOOR_MOVING: u8 = 1 << 6;
    pub const DOOR_VENTING: u8 = 1 << 7;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimDoor {
    Open,
    Closed,
    Opening,
    Closing,
    Venting,
}

struct MockState {
    door: SimDoor,
    light_on: bool,
}

fn status_byte(state: &MockState) -> u8 {
    let mut byte = match state.door {
        SimDoor::Closed => bit::DOOR_CLOSED,
        SimDoor::Open => bit::DOOR_OPENED,
        SimDoor::Opening => bit::DOOR_MOVING,
        SimDoor::Closing => bit::DOOR_MOVING | bit::DOOR_DIRECTION_CLOSING,
        SimDoor::Venting => bit::DOOR_VENTING,
    };
    if state.light_on {
        byte |= bit::LIGHT_ON;
    }
    byte
}

/// A `BusPeer` that simulates the drive in-process instead of talking to a
/// serial port. Clones share the same simulated state and subscriber lists.
#[derive(Clone)]
pub struct MockBusPeer {
    subscribers: Arc<Mutex<Subscribers>>,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBusPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBusPeer {
    pub fn new() -> Self {
        MockBusPeer {
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            state: Arc::new(Mutex::new(MockState {
                door: SimDoor::Closed,
                light_on: false,
            })),
        }
    }

    /// Emits a raw broadcast payload to every registered `on_data` listener,
    /// as if the drive itself sent it. Bypasses the simulated state.
    pub fn seed_broadcast(&self, payload: [u8; 2]) {
        self.subscribers.lock().unwrap().emit_data(payload);
    }
}

#[async_trait]
impl BusPeer for MockBusPeer {
    fn on_data(&mut self, listener: DataListener) {
        self.subscribers.lock().unwrap().on_data(listener);
    }

    fn on_error(&mut self, listener: ErrorListener) {
        self.subscribers.lock().unwrap().on_error(listener);
    }

    fn on_init(&mut self, listener: InitListener) {
        self.subscribers.lock().unwrap().on_init(listener);
    }

    fn on_open(&mut self, listener: VoidListener) {
        self.subscribers.lock().unwrap().on_open(listener);
    }

    fn on_close(&mut self, listener: VoidListener) {
        self.subscribers.lock().unwrap().on_close(listener);
    }

    async fn push_command(&mut self, flags: CommandFlags, emergency_stop: bool) -> Result<Packet, HcpError> {
        sleep(Duration::from_millis(MIN_RESPONSE_DELAY_MS)).await;

        let status = {
            let mut state = self.state.lock().unwrap();
            if flags.contains(CommandFlags::TOGGLE_LIGHT) {
                state.light_on = !state.light_on;
            }
            if flags.contains(CommandFlags::VENTING) {
                state.door = SimDoor::Venting;
            } else if flags.contains(CommandFlags::CLOSE) && state.door != SimDoor::Closed {
                state.door = SimDoor::Closing;
            } else if flags.contains(CommandFlags::OPEN) && state.door != SimDoor::Open {
                state.door = SimDoor::Opening;
            }
            status_byte(&state)
        };

        self.subscribers.lock().unwrap().emit_data([status, 0x00]);

        let mode = if emergency_stop { MODE_EMERGENCY_STOP } else { MODE_NORMAL };
        Packet::from_fields(ADDR_MASTER, 0, &[RESP_SLAVE_STATUS, flags.bits(), mode], None)
    }
}
