use bytes::Bytes;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

use crate::core::packet::{Packet, ProcessOutcome, WireId};
use crate::core::stream::{ReadStream, WriteStream};
use crate::error::{ProtocolError, Result};

type ConstructorFn = dyn Fn() -> Box<dyn Packet> + Send + Sync + 'static;

struct Entry {
    name: &'static str,
    construct: Box<ConstructorFn>,
}

/// Wire ID to packet constructor table.
///
/// Populate it once at startup, then share it read-only (`Arc<PacketRegistry>`).
/// An ID can only be claimed once; there is no unregistration.
#[derive(Default)]
pub struct PacketRegistry {
    entries: HashMap<WireId, Entry>,
    wire_ids: HashMap<TypeId, WireId>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `P` under `id`, built with `P::default()`.
    ///
    /// Fails with [`ProtocolError::DuplicateWireId`] if `id` is taken; the
    /// existing registration is left untouched.
    pub fn register<P>(&mut self, id: WireId) -> Result<()>
    where
        P: Packet + Default,
    {
        self.insert::<P>(id, Box::new(|| -> Box<dyn Packet> { Box::new(P::default()) }))
    }

    /// Register `P` under `id` with an explicit zero-argument constructor
    pub fn register_with<P, F>(&mut self, id: WireId, construct: F) -> Result<()>
    where
        P: Packet,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.insert::<P>(
            id,
            Box::new(move || -> Box<dyn Packet> { Box::new(construct()) }),
        )
    }

    fn insert<P: Packet>(&mut self, id: WireId, construct: Box<ConstructorFn>) -> Result<()> {
        let name = type_name::<P>();
        if let Some(existing) = self.entries.get(&id) {
            warn!(
                wire_id = id,
                packet = name,
                registered = existing.name,
                "Wire id already registered"
            );
            return Err(ProtocolError::DuplicateWireId(id));
        }

        self.entries.insert(id, Entry { name, construct });
        // First id wins when one type is registered under several ids
        self.wire_ids.entry(TypeId::of::<P>()).or_insert(id);
        debug!(wire_id = id, packet = name, "Registered packet type");
        Ok(())
    }

    /// Build a fresh, not yet deserialized packet for `id`
    pub fn create(&self, id: WireId) -> Option<Box<dyn Packet>> {
        self.entries.get(&id).map(|entry| (entry.construct)())
    }

    pub fn contains(&self, id: WireId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered wire IDs in ascending order
    pub fn wire_ids(&self) -> Vec<WireId> {
        let mut ids: Vec<WireId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Wire ID `P` was registered under
    pub fn wire_id_of<P: Packet>(&self) -> Option<WireId> {
        self.wire_ids.get(&TypeId::of::<P>()).copied()
    }

    /// Frame `packet` as `[wire id][fields]`
    pub fn encode<P: Packet>(&self, packet: &P) -> Result<Bytes> {
        let id = self
            .wire_id_of::<P>()
            .ok_or(ProtocolError::UnregisteredPacket(type_name::<P>()))?;

        let mut stream = WriteStream::new();
        stream.write(id);
        packet.serialize(&mut stream)?;
        Ok(stream.freeze())
    }

    /// Decode one payload into a packet without processing it
    pub fn decode(&self, payload: Bytes) -> Result<Box<dyn Packet>> {
        let mut stream = ReadStream::new(payload);
        self.decode_stream(&mut stream)
    }

    /// Decode one packet from the current position of `stream`
    pub fn decode_stream(&self, stream: &mut ReadStream) -> Result<Box<dyn Packet>> {
        let id = stream
            .read::<WireId>()
            .map_err(|_| ProtocolError::EmptyPayload)?;

        let mut packet = self
            .create(id)
            .ok_or(ProtocolError::UnknownWireId(id))?;
        packet.deserialize(stream)?;

        if stream.remaining() > 0 {
            trace!(
                wire_id = id,
                trailing = stream.remaining(),
                "Ignoring trailing bytes after packet"
            );
        }
        Ok(packet)
    }

    /// Decode and process one payload.
    ///
    /// Malformed payloads (empty, unknown wire ID, bad fields) are logged and
    /// yield `None`; `process` is only called on a fully decoded packet and its
    /// outcome is returned as is.
    pub fn handle(&self, payload: Bytes) -> Option<ProcessOutcome> {
        match self.decode(payload) {
            Ok(mut packet) => Some(packet.process()),
            Err(ProtocolError::EmptyPayload) => {
                debug!("Dropping empty payload");
                None
            }
            Err(ProtocolError::UnknownWireId(id)) => {
                debug!(wire_id = id, "Dropping payload with unknown wire id");
                None
            }
            Err(e) => {
                debug!(error = %e, "Dropping malformed payload");
                None
            }
        }
    }
}

impl fmt::Debug for PacketRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for id in self.wire_ids() {
            if let Some(entry) = self.entries.get(&id) {
                map.entry(&id, &entry.name);
            }
        }
        map.finish()
    }
}
