// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::packet::{Packet, ProcessOutcome};
use crate::core::stream::{ReadStream, WriteStream};
use crate::error::{ProtocolError, Result};
use crate::protocol::registry::PacketRegistry;
use crate::protocol::router::{EventRouter, PeerEvent};
use crate::session::SessionId;
use crate::transport::{EventKind, TransportEvent};

#[derive(Debug, Default)]
struct Greeting {
    text: String,
    processed: Arc<AtomicUsize>,
}

impl Packet for Greeting {
    fn serialize(&self, stream: &mut WriteStream) -> Result<()> {
        stream.write_string(&self.text);
        Ok(())
    }

    fn deserialize(&mut self, stream: &mut ReadStream) -> Result<()> {
        self.text = stream.read_string()?;
        Ok(())
    }

    fn process(&mut self) -> ProcessOutcome {
        self.processed.fetch_add(1, Ordering::SeqCst);
        ProcessOutcome::Success
    }
}

#[derive(Debug, Default, PartialEq)]
struct Move {
    x: i32,
    y: i32,
    running: bool,
}

impl Packet for Move {
    fn serialize(&self, stream: &mut WriteStream) -> Result<()> {
        stream.write(self.x);
        stream.write(self.y);
        stream.write(self.running);
        Ok(())
    }

    fn deserialize(&mut self, stream: &mut ReadStream) -> Result<()> {
        self.x = stream.read()?;
        self.y = stream.read()?;
        self.running = stream.read()?;
        Ok(())
    }

    fn process(&mut self) -> ProcessOutcome {
        if self.x.abs() > 1000 || self.y.abs() > 1000 {
            ProcessOutcome::Error
        } else if self.running {
            ProcessOutcome::Failure
        } else {
            ProcessOutcome::Success
        }
    }
}

fn greeting_registry(counter: Arc<AtomicUsize>) -> PacketRegistry {
    let mut registry = PacketRegistry::new();
    registry
        .register_with(0x05, move || Greeting {
            text: String::new(),
            processed: counter.clone(),
        })
        .expect("register greeting");
    registry.register::<Move>(0x10).expect("register move");
    registry
}

#[test]
fn test_hello_payload_is_decoded_and_processed_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = greeting_registry(counter.clone());

    let mut payload = vec![0x05];
    payload.extend_from_slice(&5u64.to_le_bytes());
    payload.extend_from_slice(b"Hello");

    let packet = registry.decode(Bytes::from(payload.clone())).unwrap();
    let greeting = packet.downcast_ref::<Greeting>().expect("greeting");
    assert_eq!(greeting.text, "Hello");
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    assert_eq!(
        registry.handle(Bytes::from(payload)),
        Some(ProcessOutcome::Success)
    );
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_duplicate_wire_id_keeps_first_registration() {
    let mut registry = PacketRegistry::new();
    registry.register::<Move>(0x10).unwrap();

    let err = registry.register::<Greeting>(0x10).unwrap_err();
    assert!(matches!(err, ProtocolError::DuplicateWireId(0x10)));

    let packet = registry.create(0x10).expect("still registered");
    assert!(packet.is::<Move>());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_unknown_wire_id_creates_nothing() {
    let registry = greeting_registry(Arc::default());
    assert!(registry.create(0x06).is_none());
    assert!(matches!(
        registry.decode(Bytes::from_static(&[0x06, 0x00])),
        Err(ProtocolError::UnknownWireId(0x06))
    ));
    assert_eq!(registry.handle(Bytes::from_static(&[0x06])), None);
}

#[test]
fn test_empty_payload_is_dropped() {
    let registry = greeting_registry(Arc::default());
    assert!(matches!(
        registry.decode(Bytes::new()),
        Err(ProtocolError::EmptyPayload)
    ));
    assert_eq!(registry.handle(Bytes::new()), None);
}

#[test]
fn test_truncated_fields_never_reach_process() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = greeting_registry(counter.clone());

    let mut payload = vec![0x05];
    payload.extend_from_slice(&10u64.to_le_bytes());
    payload.extend_from_slice(b"short");

    assert_eq!(registry.handle(Bytes::from(payload)), None);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_process_outcome_is_preserved() {
    let registry = greeting_registry(Arc::default());

    let walk = registry.encode(&Move { x: 1, y: 2, running: false }).unwrap();
    let run = registry.encode(&Move { x: 1, y: 2, running: true }).unwrap();
    let teleport = registry.encode(&Move { x: 5000, y: 0, running: false }).unwrap();

    assert_eq!(registry.handle(walk), Some(ProcessOutcome::Success));
    assert_eq!(registry.handle(run), Some(ProcessOutcome::Failure));
    assert_eq!(registry.handle(teleport), Some(ProcessOutcome::Error));
}

#[test]
fn test_encode_roundtrip_through_registry() {
    let registry = greeting_registry(Arc::default());
    let original = Move { x: -7, y: 300, running: true };

    let bytes = registry.encode(&original).unwrap();
    assert_eq!(bytes[0], 0x10);

    let decoded = registry.decode(bytes).unwrap();
    assert_eq!(decoded.downcast_ref::<Move>(), Some(&original));
}

#[test]
fn test_encode_unregistered_type_fails() {
    let registry = PacketRegistry::new();
    let result = registry.encode(&Move::default());
    assert!(matches!(result, Err(ProtocolError::UnregisteredPacket(_))));
}

#[test]
fn test_wire_ids_sorted() {
    let registry = greeting_registry(Arc::default());
    assert_eq!(registry.wire_ids(), vec![0x05, 0x10]);
    assert_eq!(registry.wire_id_of::<Move>(), Some(0x10));
    assert!(registry.contains(0x05));
}

fn message_event(payload: &'static [u8]) -> PeerEvent<u64> {
    PeerEvent::new(
        SessionId(3),
        TransportEvent::message(7, Bytes::from_static(payload), 0, Default::default()),
    )
}

#[test]
fn test_dispatch_without_handler_is_noop() {
    let mut router: EventRouter<u64> = EventRouter::new();
    let mut event = message_event(b"\x01");

    assert!(!router.dispatch(&mut event));
    assert_eq!(&event.payload[..], b"\x01");
    assert!(event.outcome.is_none());
}

#[test]
fn test_last_registered_handler_wins() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut router = EventRouter::new();

    let first = calls.clone();
    let second = calls.clone();
    router
        .on(EventKind::Message, move |_: &mut PeerEvent<u64>| {
            first.lock().unwrap().push("first")
        })
        .on(EventKind::Message, move |_: &mut PeerEvent<u64>| {
            second.lock().unwrap().push("second")
        });

    let mut event = message_event(b"");
    assert!(router.dispatch(&mut event));
    assert_eq!(*calls.lock().unwrap(), vec!["second"]);
    assert!(!router.has_handler(EventKind::Connect));
}

#[test]
fn test_handler_can_consume_payload_and_record_outcome() {
    let registry = Arc::new(greeting_registry(Arc::default()));
    let mut router = EventRouter::new();
    router.on(EventKind::Message, move |event: &mut PeerEvent<u64>| {
        let payload = event.take_payload();
        event.outcome = registry.handle(payload);
    });

    let mut event = message_event(b"\x05\x02\x00\x00\x00\x00\x00\x00\x00hi");
    router.dispatch(&mut event);
    assert!(event.payload.is_empty());
    assert_eq!(event.outcome, Some(ProcessOutcome::Success));

    assert!(router.clear(EventKind::Message));
    assert!(!router.dispatch(&mut event));
}

#[test]
fn test_kinds_route_independently() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut router = EventRouter::new();
    for kind in [EventKind::Connect, EventKind::Disconnect] {
        let seen = seen.clone();
        router.on(kind, move |event: &mut PeerEvent<u64>| {
            seen.lock().unwrap().push((event.kind, event.session))
        });
    }

    let mut connect = PeerEvent::new(SessionId(1), TransportEvent::connect(9u64));
    let mut message = message_event(b"");
    let mut disconnect = PeerEvent::new(SessionId(1), TransportEvent::disconnect(9u64));
    router.dispatch(&mut connect);
    router.dispatch(&mut message);
    router.dispatch(&mut disconnect);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (EventKind::Connect, SessionId(1)),
            (EventKind::Disconnect, SessionId(1))
        ]
    );
}
