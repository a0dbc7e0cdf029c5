//! End-to-end scenario tests (§8): drive a `ProtocolEngine` through the
//! slave-scan / status-poll / command-injection / broadcast sequences using
//! the same reference byte vectors the unit tests check piecewise.

use hcp1_uap1::{CommandFlags, EngineEvent, HcpError, Packet, ProtocolEngine};

const ADDR_BROADCAST: u8 = 0x00;
const ADDR_UAP1_SLAVE: u8 = 0x28;

fn scan_request(counter: u8) -> Packet {
    Packet::from_fields(ADDR_UAP1_SLAVE, counter, &[0x01, 0x80], None).unwrap()
}

fn status_request(counter: u8) -> Packet {
    Packet::from_fields(ADDR_UAP1_SLAVE, counter, &[0x20], None).unwrap()
}

fn broadcast(counter: u8, payload: [u8; 2]) -> Packet {
    Packet::from_fields(ADDR_BROADCAST, counter, &payload, None).unwrap()
}

fn response_packet(event: EngineEvent) -> Packet {
    match event {
        EngineEvent::Response { packet, .. } => packet,
        other => panic!("expected Response, got {other:?}"),
    }
}

/// Scenario 1: a slave scan at counter 13 gets an Init + Response pair, and
/// `next_counter` ends up two past the scan's own counter.
#[test]
fn scenario_1_slave_scan() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(13);

    let events = engine.process_packet(&scan_request(13));
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], EngineEvent::Init(_)));
    let response = response_packet(events.into_iter().nth(1).unwrap());
    assert_eq!(response.hex_string(), "80e21428cb");
    assert_eq!(engine.next_counter(), 15);
}

/// Scenario 2: a bare status poll with no pending command gets the
/// idle/normal-mode reply.
#[test]
fn scenario_2_idle_status_poll() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(13);

    let events = engine.process_packet(&status_request(13));
    let response = response_packet(events.into_iter().next().unwrap());
    assert_eq!(response.hex_string(), "80e32900106f");
}

/// Scenario 3: a pending OPEN command is piggybacked onto the next poll and
/// its resolver is only fulfilled once the caller confirms the write.
#[tokio::test]
async fn scenario_3_command_piggybacks_onto_poll() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(13);

    let mut pending = engine.push_command(CommandFlags::OPEN, false);
    let events = engine.process_packet(&status_request(13));
    let (response, resolver) = match events.into_iter().next().unwrap() {
        EngineEvent::Response { packet, resolver } => (packet, resolver),
        other => panic!("expected Response, got {other:?}"),
    };
    assert_eq!(response.hex_string(), "80e32901107a");

    assert!(pending.try_recv().is_err(), "resolver must not fire before the write is confirmed");
    resolver.unwrap().send(response.clone()).unwrap();
    assert_eq!(pending.await.unwrap(), response);
}

/// Scenario 4: a broadcast carrying door-open + light-on decodes cleanly and
/// advances `next_counter` once.
#[test]
fn scenario_4_broadcast_decode() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(0xD);

    let events = engine.process_packet(&broadcast(0xD, [0x0E, 0x02]));
    assert_eq!(events.len(), 1);
    match &events[0] {
        EngineEvent::Broadcast(payload) => assert_eq!(*payload, [0x0E, 0x02]),
        other => panic!("expected Broadcast, got {other:?}"),
    }
    assert_eq!(engine.next_counter(), 0xE);
}

/// Scenario 5: a slave-addressed packet with an unexpected counter is a
/// protocol error, not a panic or silent drop.
#[test]
fn scenario_5_bad_counter_is_reported() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(1);

    let events = engine.process_packet(&status_request(5));
    assert!(matches!(
        events[0],
        EngineEvent::Error(HcpError::BadCounter { expected: 1, got: 5 })
    ));
}

/// Scenario 6: an unrecognized slave command code surfaces the command byte
/// for diagnostics instead of being silently ignored.
#[test]
fn scenario_6_unknown_slave_command_is_reported() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(1);

    let p = Packet::from_fields(ADDR_UAP1_SLAVE, 1, &[0x55], None).unwrap();
    let events = engine.process_packet(&p);
    assert!(matches!(events[0], EngineEvent::Error(HcpError::UnknownSlaveCommand(0x55))));
}

/// Scenario 7: traffic addressed to another slave only advances the counter
/// when it matches; a mismatched counter is ignored rather than reported,
/// since this engine isn't the addressee.
#[test]
fn scenario_7_other_slave_traffic_is_silently_tracked() {
    let mut engine = ProtocolEngine::new();
    engine.force_next_counter(1);

    let matching = Packet::from_fields(0x30, 1, &[0x20], None).unwrap();
    assert!(engine.process_packet(&matching).is_empty());
    assert_eq!(engine.next_counter(), 2);

    let mismatched = Packet::from_fields(0x30, 9, &[0x20], None).unwrap();
    assert!(engine.process_packet(&mismatched).is_empty());
    assert_eq!(engine.next_counter(), 2);
}
