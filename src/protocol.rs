//! Bus protocol engine (§4.4).
//!
//! Owns the single `next_counter` cell and the FIFO command queue; classifies
//! each inbound [`Packet`] and produces the events the door state machine and
//! serial adapter react to. Carries no I/O of its own; the serial adapter
//! is responsible for the ≥3 ms pre-response delay (§4.4 "Response timing")
//! and for actually writing `EngineEvent::Response` packets to the wire.

use std::collections::VecDeque;

use bitflags::bitflags;
use tokio::sync::oneshot;

use crate::constants::{
    ADDR_BROADCAST, ADDR_MASTER, ADDR_UAP1_SLAVE, CMD_SLAVE_SCAN, CMD_SLAVE_STATUS_REQUEST,
    MODE_EMERGENCY_STOP, MODE_NORMAL, RESP_SLAVE_STATUS, SLAVE_SCAN_WHO_FROM_MASTER, UAP1_TYPE,
};
use crate::error::HcpError;
use crate::logging::log_debug;
use crate::packet::Packet;

bitflags! {
    /// Command bits packed into byte 0 of a slave-status response (§3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u8 {
        const OPEN = 0b0001;
        const CLOSE = 0b0010;
        const TOGGLE_LIGHT = 0b0100;
        const VENTING = 0b1000;
    }
}

/// Events produced while classifying an inbound packet.
#[derive(Debug)]
pub enum EngineEvent {
    /// A 2-byte broadcast status payload, destined for the door state machine.
    Broadcast([u8; 2]),
    /// A slave-scan reply was built; the drive now knows this slave exists.
    Init(Packet),
    /// A response ready to be sent after the minimum response delay. Carries
    /// the resolver for any command that was piggybacked onto it, which the
    /// caller fulfills once the packet is actually written to the bus.
    Response {
        packet: Packet,
        resolver: Option<oneshot::Sender<Packet>>,
    },
    /// A non-fatal protocol error; the session is not torn down.
    Error(HcpError),
}

struct PendingCommand {
    flags: CommandFlags,
    emergency_stop: bool,
    resolver: oneshot::Sender<Packet>,
}

/// Tracks `next_counter` and the outbound command queue; classifies inbound
/// packets into [`EngineEvent`]s.
pub struct ProtocolEngine {
    next_counter: u8,
    queue: VecDeque<PendingCommand>,
}

impl ProtocolEngine {
    pub fn new() -> Self {
        ProtocolEngine {
            next_counter: 1,
            queue: VecDeque::new(),
        }
    }

    pub fn next_counter(&self) -> u8 {
        self.next_counter
    }

    /// Forces `next_counter` to an arbitrary value, bypassing the normal
    /// wraparound invariant. Used to exercise the forced-resync path from a
    /// known-bad state; not part of normal operation.
    pub fn force_next_counter(&mut self, value: u8) {
        self.next_counter = value;
    }

    /// Queues a command to be piggybacked onto the next slave-status poll.
    /// The returned receiver resolves with the packet actually sent, or is
    /// dropped (receiver sees a closed channel) if the port closes first.
    pub fn push_command(
        &mut self,
        flags: CommandFlags,
        emergency_stop: bool,
    ) -> oneshot::Receiver<Packet> {
        let (resolver, receiver) = oneshot::channel();
        self.queue.push_back(PendingCommand {
            flags,
            emergency_stop,
            resolver,
        });
        receiver
    }

    /// Classifies an inbound packet, mutating `next_counter`/`queue` as needed.
    pub fn process_packet(&mut self, packet: &Packet) -> Vec<EngineEvent> {
        match packet.address() {
            ADDR_BROADCAST => self.handle_broadcast(packet),
            ADDR_UAP1_SLAVE => self.handle_slave(packet),
            _ => self.handle_other(packet),
        }
    }

    fn handle_broadcast(&mut self, packet: &Packet) -> Vec<EngineEvent> {
        if packet.counter_nibble() != self.next_counter {
            log_debug(&format!(
                "broadcast counter resync: expected {}, got {}",
                self.next_counter,
                packet.counter_nibble()
            ));
        }
        self.next_counter = (packet.counter_nibble() + 1) % 16;

        let payload = packet.payload();
        if payload.len() != 2 {
            return vec![EngineEvent::Error(HcpError::BadPayloadLen(payload.len()))];
        }
        vec![EngineEvent::Broadcast([payload[0], payload[1]])]
    }

    fn handle_slave(&mut self, packet: &Packet) -> Vec<EngineEvent> {
        if packet.counter_nibble() != self.next_counter {
            return vec![EngineEvent::Error(HcpError::BadCounter {
                expected: self.next_counter,
                got: packet.counter_nibble(),
            })];
        }

        let payload = packet.payload();

        if payload == [CMD_SLAVE_SCAN, SLAVE_SCAN_WHO_FROM_MASTER] {
            let response = self.build_response(&[UAP1_TYPE, ADDR_UAP1_SLAVE]);
            return vec![
                EngineEvent::Init(response.clone()),
                EngineEvent::Response {
                    packet: response,
                    resolver: None,
                },
            ];
        }

        if payload.first() == Some(&CMD_SLAVE_SCAN) {
            return vec![EngineEvent::Error(HcpError::BadScanPayload)];
        }

        if payload == [CMD_SLAVE_STATUS_REQUEST] {
            let popped = self.queue.pop_front();
            let reply_payload = match &popped {
                Some(cmd) => [RESP_SLAVE_STATUS, cmd.flags.bits(), mode_byte(cmd.emergency_stop)],
                None => [RESP_SLAVE_STATUS, 0x00, MODE_NORMAL],
            };
            let response = self.build_response(&reply_payload);
            let resolver = popped.map(|cmd| cmd.resolver);
            return vec![EngineEvent::Response {
                packet: response,
                resolver,
            }];
        }

        vec![EngineEvent::Error(HcpError::UnknownSlaveCommand(
            payload.first().copied().unwrap_or(0),
        ))]
    }

    fn handle_other(&mut self, packet: &Packet) -> Vec<EngineEvent> {
        if packet.counter_nibble() == self.next_counter {
            self.next_counter = (self.next_counter + 1) % 16;
        }
        Vec::new()
    }

    /// Advances `next_counter` twice: once to obtain the counter the response
    /// itself carries, once more so the *next* inbound frame is expected one
    /// past the response (§4.4 counter policy).
    fn build_response(&mut self, payload: &[u8]) -> Packet {
        self.next_counter = (self.next_counter + 1) % 16;
        let response_counter = self.next_counter;
        self.next_counter = (self.next_counter + 1) % 16;

        Packet::from_fields(ADDR_MASTER, response_counter, payload, None)
            .expect("engine-built responses always have valid fields")
    }
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn mode_byte(emergency_stop: bool) -> u8 {
    if emergency_stop {
        MODE_EMERGENCY_STOP
    } else {
        MODE_NORMAL
    }
}
