//! Property-based tests using proptest
//!
//! Exercise the byte streams, the packet registry and the session table with
//! arbitrary inputs: reads never go out of bounds, failed reads never move the
//! cursor, and session bookkeeping stays consistent under any call sequence.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::Bytes;
use proptest::prelude::*;
use wirebind::{
    Packet, PacketRegistry, ProcessOutcome, ReadStream, Result, SessionId, SessionTable,
    WriteStream,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Profile {
    id: u32,
    score: i64,
    online: bool,
    name: String,
    avatar: Vec<u8>,
}

impl Packet for Profile {
    fn serialize(&self, stream: &mut WriteStream) -> Result<()> {
        stream.write(self.id);
        stream.write(self.score);
        stream.write(self.online);
        stream.write_string(&self.name);
        stream.write_bytes(&self.avatar);
        Ok(())
    }

    fn deserialize(&mut self, stream: &mut ReadStream) -> Result<()> {
        self.id = stream.read()?;
        self.score = stream.read()?;
        self.online = stream.read()?;
        self.name = stream.read_string()?;
        self.avatar = stream.read_bytes()?;
        Ok(())
    }

    fn process(&mut self) -> ProcessOutcome {
        ProcessOutcome::Success
    }
}

#[derive(Debug, Clone)]
enum ReadOp {
    U8,
    U32,
    U64,
    Bool,
    Str,
    Blob,
}

fn read_op() -> impl Strategy<Value = ReadOp> {
    prop_oneof![
        Just(ReadOp::U8),
        Just(ReadOp::U32),
        Just(ReadOp::U64),
        Just(ReadOp::Bool),
        Just(ReadOp::Str),
        Just(ReadOp::Blob),
    ]
}

fn apply(stream: &mut ReadStream, op: &ReadOp) -> bool {
    match op {
        ReadOp::U8 => stream.read::<u8>().is_ok(),
        ReadOp::U32 => stream.read::<u32>().is_ok(),
        ReadOp::U64 => stream.read::<u64>().is_ok(),
        ReadOp::Bool => stream.read::<bool>().is_ok(),
        ReadOp::Str => stream.read_string().is_ok(),
        ReadOp::Blob => stream.read_bytes().is_ok(),
    }
}

// Property: any read sequence over arbitrary bytes stays in bounds, and a
// failed read leaves the cursor where it was
proptest! {
    #[test]
    fn prop_reads_never_overrun(
        data in prop::collection::vec(any::<u8>(), 0..256),
        ops in prop::collection::vec(read_op(), 0..32),
    ) {
        let mut stream = ReadStream::from_slice(&data);
        for op in &ops {
            let before = stream.position();
            let ok = apply(&mut stream, op);
            prop_assert!(stream.position() <= data.len());
            prop_assert_eq!(stream.position() + stream.remaining(), data.len());
            if !ok {
                prop_assert_eq!(stream.position(), before);
            }
        }
    }
}

// Property: a length prefix larger than what follows is always rejected
proptest! {
    #[test]
    fn prop_oversized_prefix_rejected(
        body in prop::collection::vec(any::<u8>(), 0..64),
        excess in 1u64..=u64::MAX / 2,
    ) {
        let mut out = WriteStream::new();
        out.write(body.len() as u64 + excess);
        let mut raw = out.as_bytes().to_vec();
        raw.extend_from_slice(&body);

        let mut stream = ReadStream::from_slice(&raw);
        prop_assert!(stream.read_bytes().is_err());
        prop_assert_eq!(stream.position(), 0);
    }
}

// Property: registered packets decode back to what was encoded, whatever
// trails the packet body
proptest! {
    #[test]
    fn prop_packet_survives_registry(
        id in any::<u32>(),
        score in any::<i64>(),
        online in any::<bool>(),
        name in ".{0,40}",
        avatar in prop::collection::vec(any::<u8>(), 0..128),
        trailing in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut registry = PacketRegistry::new();
        registry.register::<Profile>(0x10).unwrap();
        let profile = Profile { id, score, online, name, avatar };

        let mut framed = registry.encode(&profile).unwrap().to_vec();
        framed.extend_from_slice(&trailing);

        let decoded = registry.decode(Bytes::from(framed)).unwrap();
        prop_assert_eq!(decoded.downcast_ref::<Profile>(), Some(&profile));
    }
}

// Property: every strict prefix of a valid frame fails to decode and is never
// processed
proptest! {
    #[test]
    fn prop_truncated_frames_are_dropped(
        name in "[a-z]{0,16}",
        avatar in prop::collection::vec(any::<u8>(), 0..16),
        cut in any::<prop::sample::Index>(),
    ) {
        let mut registry = PacketRegistry::new();
        registry.register::<Profile>(0x10).unwrap();
        let framed = registry
            .encode(&Profile { name, avatar, ..Profile::default() })
            .unwrap();

        let cut = cut.index(framed.len());
        prop_assert!(registry.handle(framed.slice(..cut)).is_none());
    }
}

#[derive(Debug, Clone)]
enum TableOp {
    Acquire(u8),
    Release(u32),
    ReleasePeer(u8),
}

fn table_op() -> impl Strategy<Value = TableOp> {
    prop_oneof![
        any::<u8>().prop_map(TableOp::Acquire),
        (0u32..12).prop_map(TableOp::Release),
        any::<u8>().prop_map(TableOp::ReleasePeer),
    ]
}

// Property: forward and reverse lookups always agree and IDs stay in range
proptest! {
    #[test]
    fn prop_session_lookups_stay_symmetric(
        capacity in 0u32..8,
        ops in prop::collection::vec(table_op(), 0..64),
    ) {
        let mut table: SessionTable<u8> = SessionTable::new(capacity);
        for op in ops {
            match op {
                TableOp::Acquire(peer) => {
                    let was_bound = table.lookup_by_peer(&peer).is_some();
                    let was_full = table.is_full();
                    match table.acquire(peer) {
                        Some(id) => {
                            prop_assert!(!was_bound && !was_full);
                            prop_assert!(id.0 < capacity);
                        }
                        None => prop_assert!(was_bound || was_full),
                    }
                }
                TableOp::Release(id) => {
                    table.release(SessionId(id));
                }
                TableOp::ReleasePeer(peer) => {
                    table.release_peer(&peer);
                }
            }

            prop_assert!(table.active_count() <= capacity as usize);
            for id in table.active_ids() {
                let peer = table.lookup_by_id(id).expect("active id has a peer");
                prop_assert_eq!(table.lookup_by_peer(&peer), Some(id));
            }
        }
    }
}
