//! Top-level client (§6.4): ties configuration, the serial adapter, the
//! protocol engine, and the door state machine together behind the
//! programmatic surface embedders use.
//!
//! [`LiveBusPeer`] is the live [`BusPeer`] implementation (serial adapter +
//! protocol engine, run as a background task); [`Hcp1Client`] is generic
//! over any `BusPeer` so it works identically against
//! [`crate::testing::MockBusPeer`] in tests (§4.7 "so C5 is peer-agnostic").

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::sleep;

use crate::bus_peer::{BusPeer, DataListener, ErrorListener, InitListener, Subscribers, VoidListener};
use crate::config::Config;
use crate::constants::MIN_RESPONSE_DELAY_MS;
use crate::door::{DoorEvent, DoorState, DoorStateMachine, TargetDoorState};
use crate::error::HcpError;
use crate::packet::Packet;
use crate::protocol::{CommandFlags, EngineEvent, ProtocolEngine};
use crate::serial::SerialAdapter;

/// The live bus peer: a serial adapter and protocol engine running as a
/// background read loop, exposed through the [`BusPeer`] trait. Clones share
/// the same underlying port, engine, and subscriber lists.
#[derive(Clone)]
pub struct LiveBusPeer {
    adapter: Arc<AsyncMutex<SerialAdapter>>,
    engine: Arc<StdMutex<ProtocolEngine>>,
    subscribers: Arc<StdMutex<Subscribers>>,
}

impl LiveBusPeer {
    pub async fn connect(config: &Config) -> Result<Self, HcpError> {
        let adapter = SerialAdapter::open(config).await?;
        let peer = LiveBusPeer {
            adapter: Arc::new(AsyncMutex::new(adapter)),
            engine: Arc::new(StdMutex::new(ProtocolEngine::new())),
            subscribers: Arc::new(StdMutex::new(Subscribers::default())),
        };
        peer.subscribers.lock().unwrap().emit_open();
        Ok(peer)
    }

    /// Drives the read/dispatch loop. Runs until the port closes; intended
    /// to be spawned as its own task (`tokio::spawn(peer.run())`).
    pub async fn run(self: Arc<Self>) -> Result<(), HcpError> {
        loop {
            let chunk = {
                let mut adapter = self.adapter.lock().await;
                adapter.read_chunk().await
            };

            let packets = match chunk {
                Ok(packets) => packets,
                Err(HcpError::PortClosed) => {
                    self.subscribers.lock().unwrap().emit_close();
                    return Err(HcpError::PortClosed);
                }
                Err(err) => {
                    self.subscribers.lock().unwrap().emit_error(err);
                    continue;
                }
            };

            for packet in packets {
                self.dispatch(packet).await;
            }
        }
    }

    async fn dispatch(&self, packet: Packet) {
        let events = self.engine.lock().unwrap().process_packet(&packet);
        for event in events {
            match event {
                EngineEvent::Broadcast(payload) => {
                    self.subscribers.lock().unwrap().emit_data(payload);
                }
                EngineEvent::Init(packet) => {
                    self.subscribers.lock().unwrap().emit_init(packet);
                }
                EngineEvent::Error(err) => {
                    self.subscribers.lock().unwrap().emit_error(err);
                }
                EngineEvent::Response { packet, resolver } => {
                    sleep(Duration::from_millis(MIN_RESPONSE_DELAY_MS)).await;
                    let write_result = {
                        let mut adapter = self.adapter.lock().await;
                        adapter.write_packet(&packet).await
                    };
                    match write_result {
                        Ok(()) => {
                            if let Some(resolver) = resolver {
                                let _ = resolver.send(packet);
                            }
                        }
                        Err(err) => self.subscribers.lock().unwrap().emit_error(err),
                    }
                }
            }
        }
    }
}

#[async_trait]
impl BusPeer for LiveBusPeer {
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

    async fn push_command(
        &mut self,
        flags: CommandFlags,
        emergency_stop: bool,
    ) -> Result<Packet, HcpError> {
        let receiver = self.engine.lock().unwrap().push_command(flags, emergency_stop);
        receiver.await.map_err(|_| HcpError::PortClosed)
    }
}

#[derive(Default)]
struct ClientListeners {
    update_door: Vec<Box<dyn Fn(DoorState) + Send + Sync>>,
    update_light: Vec<Box<dyn Fn(bool) + Send + Sync>>,
    error: Vec<Box<dyn Fn(HcpError) + Send + Sync>>,
}

/// The embedder-facing client (§6.4): `get_current_state`, `get_target_state`,
/// `set_target_state`, `get_light_on_state`, `set_light_on_state`, plus
/// `update_door`/`update_light`/`error` events.
pub struct Hcp1Client<P: BusPeer> {
    peer: P,
    door: Arc<StdMutex<DoorStateMachine>>,
    listeners: Arc<StdMutex<ClientListeners>>,
}

impl<P: BusPeer> Hcp1Client<P> {
    pub fn new(mut peer: P) -> Self {
        let door = Arc::new(StdMutex::new(DoorStateMachine::new()));
        let listeners = Arc::new(StdMutex::new(ClientListeners::default()));

        let door_for_data = door.clone();
        let listeners_for_data = listeners.clone();
        peer.on_data(Box::new(move |payload| {
            let events = door_for_data.lock().unwrap().on_broadcast(payload);
            let listeners = listeners_for_data.lock().unwrap();
            for event in events {
                match event {
                    DoorEvent::UpdateDoor(state) => {
                        for listener in &listeners.update_door {
                            listener(state);
                        }
                    }
                    DoorEvent::UpdateLight(on) => {
                        for listener in &listeners.update_light {
                            listener(on);
                        }
                    }
                    DoorEvent::Error(err) => {
                        for listener in &listeners.error {
                            listener(err.clone());
                        }
                    }
                }
            }
        }));

        let listeners_for_error = listeners.clone();
        peer.on_error(Box::new(move |err| {
            for listener in &listeners_for_error.lock().unwrap().error {
                listener(err.clone());
            }
        }));

        Hcp1Client { peer, door, listeners }
    }

    pub fn get_current_state(&self) -> Result<DoorState, HcpError> {
        self.door.lock().unwrap().get_current_state()
    }

    pub fn get_target_state(&self) -> Result<TargetDoorState, HcpError> {
        self.door.lock().unwrap().get_target_state()
    }

    pub fn get_light_on_state(&self) -> Result<bool, HcpError> {
        self.door.lock().unwrap().get_light_on_state()
    }

    pub fn on_update_door(&self, listener: impl Fn(DoorState) + Send + Sync + 'static) {
        self.listeners.lock().unwrap().update_door.push(Box::new(listener));
    }

    pub fn on_update_light(&self, listener: impl Fn(bool) + Send + Sync + 'static) {
        self.listeners.lock().unwrap().update_light.push(Box::new(listener));
    }

    pub fn on_error(&self, listener: impl Fn(HcpError) + Send + Sync + 'static) {
        self.listeners.lock().unwrap().error.push(Box::new(listener));
    }

    /// Pushes the command needed to reach `target`, if any, and records the
    /// new target once the drive has accepted it.
    pub async fn set_target_state(&mut self, target: TargetDoorState) -> Result<(), HcpError> {
        let flags = self.door.lock().unwrap().set_target_state(target);
        match flags {
            None => Ok(()),
            Some(flags) => {
                self.peer.push_command(flags, false).await?;
                self.door.lock().unwrap().confirm_target_state(target);
                Ok(())
            }
        }
    }

    /// Pushes `TOGGLE_LIGHT` if needed. The stored light state only updates
    /// once the next broadcast reflects the change, not from this call.
    pub async fn set_light_on_state(&mut self, on: bool) -> Result<(), HcpError> {
        let flags = self.door.lock().unwrap().set_light_on_state(on);
        match flags {
            None => Ok(()),
            Some(flags) => {
                self.peer.push_command(flags, false).await?;
                Ok(())
            }
        }
    }

    /// Triggers an emergency stop: empty flags with `emergency_stop=true`.
    pub async fn emergency_stop(&mut self) -> Result<(), HcpError> {
        self.peer.push_command(CommandFlags::empty(), true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBusPeer;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn set_target_state_reaches_the_requested_target() {
        let peer = MockBusPeer::new();
        let mut client = Hcp1Client::new(peer);
        client.set_target_state(TargetDoorState::Open).await.unwrap();
        assert_eq!(client.get_target_state().unwrap(), TargetDoorState::Open);
    }

    #[tokio::test]
    async fn update_door_listener_fires_on_broadcast() {
        let peer = MockBusPeer::new();
        let client = Hcp1Client::new(peer.clone());
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        client.on_update_door(move |_state| fired2.store(true, Ordering::SeqCst));
        peer.seed_broadcast([0x02, 0x00]);
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }
}
