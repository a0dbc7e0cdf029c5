//! Door/light state machine (§4.5).
//!
//! Translates broadcast status bytes into a domain-level [`DoorState`] and
//! light flag, and translates target-state requests into the
//! [`CommandFlags`] the protocol engine should push. Current/target/light
//! cells start unset; getters fail with [`HcpError::NotInitialized`] until
//! the first decoded broadcast or `set_*` call populates them.

use crate::error::HcpError;
use crate::protocol::CommandFlags;

/// The door's current motion/position state, decoded from a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
    Opening,
    Closing,
    Stopped,
    Venting,
}

/// A door position an embedder can request via [`DoorStateMachine::set_target_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDoorState {
    Open,
    Closed,
    Venting,
}

/// Events emitted while decoding broadcasts or servicing target/light requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorEvent {
    UpdateDoor(DoorState),
    UpdateLight(bool),
    Error(HcpError),
}

/// Byte-0 bit positions of a broadcast status payload (§3).
mod bit {
    pub const DOOR_CLOSED: u8 = 1 << 0;
    pub const DOOR_OPENED: u8 = 1 << 1;
    pub const EXT_RELAY: u8 = 1 << 2;
    pub const LIGHT_ON: u8 = 1 << 3;
    pub const ERROR_ACTIVE: u8 = 1 << 4;
    pub const DOOR_DIRECTION_CLOSING: u8 = 1 << 5;
    pub const DOOR_MOVING: u8 = 1 << 6;
    pub const DOOR_VENTING: u8 = 1 << 7;
}

pub struct DoorStateMachine {
    current: Option<DoorState>,
    target: Option<TargetDoorState>,
    light_on: Option<bool>,
    /// Last raw broadcast byte 0, used for dedupe. Byte 1 is cached purely
    /// for diagnostics; its semantics are unspecified and it never affects
    /// decode or dedupe (see the Open Question decision in the project's
    /// design ledger).
    last_raw: Option<[u8; 2]>,
}

impl DoorStateMachine {
    pub fn new() -> Self {
        DoorStateMachine {
            current: None,
            target: None,
            light_on: None,
            last_raw: None,
        }
    }

    pub fn get_current_state(&self) -> Result<DoorState, HcpError> {
        self.current.ok_or(HcpError::NotInitialized)
    }

    pub fn get_target_state(&self) -> Result<TargetDoorState, HcpError> {
        self.target.ok_or(HcpError::NotInitialized)
    }

    pub fn get_light_on_state(&self) -> Result<bool, HcpError> {
        self.light_on.ok_or(HcpError::NotInitialized)
    }

    /// Diagnostic-only cache of the last raw broadcast, byte 1 included.
    pub fn last_raw(&self) -> Option<[u8; 2]> {
        self.last_raw
    }

    /// Decodes a raw 2-byte broadcast payload, deduping on byte 0 and
    /// emitting `UpdateDoor`/`UpdateLight` only when the decoded value
    /// actually changes.
    pub fn on_broadcast(&mut self, payload: [u8; 2]) -> Vec<DoorEvent> {
        if let Some(last) = self.last_raw {
            if last[0] == payload[0] {
                self.last_raw = Some(payload);
                return Vec::new();
            }
        }
        self.last_raw = Some(payload);

        let status = payload[0];
        let light_on = status & bit::LIGHT_ON != 0;
        let mut events = Vec::new();

        match Self::decode_door(status) {
            Ok(door) => {
                if self.current != Some(door) {
                    self.current = Some(door);
                    events.push(DoorEvent::UpdateDoor(door));
                }
            }
            Err(err) => events.push(DoorEvent::Error(err)),
        }

        if self.light_on != Some(light_on) {
            self.light_on = Some(light_on);
            events.push(DoorEvent::UpdateLight(light_on));
        }

        events
    }

    fn decode_door(status: u8) -> Result<DoorState, HcpError> {
        if status & bit::ERROR_ACTIVE != 0 {
            return Err(HcpError::ErrorActive);
        }
        if status & bit::DOOR_MOVING != 0 {
            return Ok(if status & bit::DOOR_DIRECTION_CLOSING != 0 {
                DoorState::Closing
            } else {
                DoorState::Opening
            });
        }
        if status & bit::DOOR_OPENED != 0 {
            return Ok(DoorState::Open);
        }
        if status & bit::DOOR_CLOSED != 0 {
            return Ok(DoorState::Closed);
        }
        if status & bit::DOOR_VENTING != 0 {
            return Ok(DoorState::Venting);
        }
        let _ = bit::EXT_RELAY; // not used for decoding, kept for documentation of the bit layout
        Err(HcpError::UnknownStatus)
    }

    /// Maps a target state to its command flags (§4.5). `STOPPED` has no
    /// direct target; emergency stop is a side channel via empty flags.
    fn target_flags(target: TargetDoorState) -> CommandFlags {
        match target {
            TargetDoorState::Open => CommandFlags::OPEN,
            TargetDoorState::Closed => CommandFlags::CLOSE,
            TargetDoorState::Venting => CommandFlags::VENTING,
        }
    }

    /// `current` and `target` are numerically coincident for OPEN/CLOSED/VENTING
    /// (the spec's "value-equal across the two enums" note); used only to
    /// decide whether reaching a target requires sending a command.
    fn current_matches_target(current: DoorState, target: TargetDoorState) -> bool {
        matches!(
            (current, target),
            (DoorState::Open, TargetDoorState::Open)
                | (DoorState::Closed, TargetDoorState::Closed)
                | (DoorState::Venting, TargetDoorState::Venting)
        )
    }

    /// Returns `Some(flags)` if a command must be pushed to reach `new`, or
    /// `None` if the target was recorded without sending anything (already
    /// equal to the current target, or already equal to the current door
    /// state).
    pub fn set_target_state(&mut self, new: TargetDoorState) -> Option<CommandFlags> {
        if self.target == Some(new) {
            return None;
        }
        if let Some(current) = self.current {
            if Self::current_matches_target(current, new) {
                self.target = Some(new);
                return None;
            }
        }
        Some(Self::target_flags(new))
    }

    /// Call once the pushed command (from [`set_target_state`]) has actually
    /// been sent, to record the new target.
    pub fn confirm_target_state(&mut self, new: TargetDoorState) {
        self.target = Some(new);
    }

    /// Returns `Some(TOGGLE_LIGHT)` if a command must be pushed, or `None`
    /// if `new` already matches the stored light state. The stored state
    /// itself only updates from the next broadcast, not from this call.
    pub fn set_light_on_state(&mut self, new: bool) -> Option<CommandFlags> {
        if self.light_on == Some(new) {
            return None;
        }
        Some(CommandFlags::TOGGLE_LIGHT)
    }
}

impl Default for DoorStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_fail_before_first_broadcast() {
        let machine = DoorStateMachine::new();
        assert_eq!(machine.get_current_state(), Err(HcpError::NotInitialized));
        assert_eq!(machine.get_target_state(), Err(HcpError::NotInitialized));
        assert_eq!(machine.get_light_on_state(), Err(HcpError::NotInitialized));
    }

    #[test]
    fn broadcast_decode_matches_reference_scenario() {
        let mut machine = DoorStateMachine::new();
        let events = machine.on_broadcast([0x0E, 0x02]);
        assert_eq!(events, vec![DoorEvent::UpdateDoor(DoorState::Open), DoorEvent::UpdateLight(true)]);
        assert_eq!(machine.get_current_state().unwrap(), DoorState::Open);
        assert!(machine.get_light_on_state().unwrap());
    }

    #[test]
    fn decode_is_idempotent_on_unchanged_byte_zero() {
        let mut machine = DoorStateMachine::new();
        machine.on_broadcast([0x0E, 0x02]);
        let events = machine.on_broadcast([0x0E, 0x99]); // byte 1 differs, byte 0 doesn't
        assert!(events.is_empty());
    }

    #[test]
    fn moving_state_uses_direction_bit() {
        let mut machine = DoorStateMachine::new();
        let opening = 0b0100_0000; // moving, direction=0
        let closing = 0b0110_0000; // moving, direction=1
        assert_eq!(
            machine.on_broadcast([opening, 0]),
            vec![DoorEvent::UpdateDoor(DoorState::Opening), DoorEvent::UpdateLight(false)]
        );
        assert_eq!(machine.on_broadcast([closing, 0]), vec![DoorEvent::UpdateDoor(DoorState::Closing)]);
    }

    #[test]
    fn error_active_bit_emits_error_and_does_not_update_state() {
        let mut machine = DoorStateMachine::new();
        machine.on_broadcast([bit::DOOR_CLOSED, 0]);
        let events = machine.on_broadcast([bit::ERROR_ACTIVE, 0]);
        assert_eq!(events, vec![DoorEvent::Error(HcpError::ErrorActive)]);
        assert_eq!(machine.get_current_state().unwrap(), DoorState::Closed);
    }

    #[test]
    fn unknown_status_on_all_zero_byte() {
        let mut machine = DoorStateMachine::new();
        let events = machine.on_broadcast([0x00, 0x00]);
        assert_eq!(events, vec![DoorEvent::Error(HcpError::UnknownStatus)]);
    }

    #[test]
    fn set_target_state_no_op_when_already_equal_to_current() {
        let mut machine = DoorStateMachine::new();
        machine.on_broadcast([bit::DOOR_OPENED, 0]);
        let cmd = machine.set_target_state(TargetDoorState::Open);
        assert!(cmd.is_none());
        assert_eq!(machine.get_target_state().unwrap(), TargetDoorState::Open);
    }

    #[test]
    fn set_target_state_no_op_when_already_equal_to_target() {
        let mut machine = DoorStateMachine::new();
        machine.on_broadcast([bit::DOOR_CLOSED, 0]);
        let first = machine.set_target_state(TargetDoorState::Open);
        assert!(first.is_some());
        machine.confirm_target_state(TargetDoorState::Open);
        let second = machine.set_target_state(TargetDoorState::Open);
        assert!(second.is_none());
    }

    #[test]
    fn set_target_state_pushes_command_when_needed() {
        let mut machine = DoorStateMachine::new();
        machine.on_broadcast([bit::DOOR_CLOSED, 0]);
        let cmd = machine.set_target_state(TargetDoorState::Open);
        assert_eq!(cmd, Some(CommandFlags::OPEN));
    }

    #[test]
    fn set_light_on_state_no_op_when_equal() {
        let mut machine = DoorStateMachine::new();
        machine.on_broadcast([bit::LIGHT_ON, 0]);
        assert!(machine.set_light_on_state(true).is_none());
        assert_eq!(machine.set_light_on_state(false), Some(CommandFlags::TOGGLE_LIGHT));
    }
}
