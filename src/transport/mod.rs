//! # Transport Layer
//!
//! The contract this crate expects from an ENet-style host/peer transport.
//!
//! Connection setup, retransmission, ordering and congestion control all
//! belong to the transport. This crate only consumes its events and hands it
//! framed payloads to send.
//!
//! ## Components
//! - **Transport**: host operations (`connect`, `disconnect`, `poll`, `send`)
//! - **TransportEvent**: one connect, disconnect or message occurrence
//! - **PacketFlags**: ENet-compatible delivery flags
//! - **Memory**: deterministic in-process transport for tests

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::BitOr;
use std::time::Duration;

use crate::error::Result;

pub mod memory;

/// Opaque, copyable token naming one remote endpoint.
///
/// Handles are only stored and compared, never dereferenced.
pub trait PeerHandle: Copy + Eq + Hash + Debug + Send + 'static {}

impl<T> PeerHandle for T where T: Copy + Eq + Hash + Debug + Send + 'static {}

/// Kind of transport occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Connect,
    Disconnect,
    Message,
}

/// Delivery flags passed through to the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketFlags(pub u32);

impl PacketFlags {
    pub const NONE: PacketFlags = PacketFlags(0);
    /// Retransmit until acknowledged
    pub const RELIABLE: PacketFlags = PacketFlags(1 << 0);
    /// Deliver out of order
    pub const UNSEQUENCED: PacketFlags = PacketFlags(1 << 1);
    /// Fragment unreliable payloads instead of upgrading them to reliable
    pub const UNRELIABLE_FRAGMENT: PacketFlags = PacketFlags(1 << 3);

    pub fn contains(self, other: PacketFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for PacketFlags {
    type Output = PacketFlags;

    fn bitor(self, rhs: PacketFlags) -> PacketFlags {
        PacketFlags(self.0 | rhs.0)
    }
}

/// One event produced by [`Transport::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent<P> {
    pub kind: EventKind,
    pub peer: P,
    /// Message body; empty for connect and disconnect
    pub payload: Bytes,
    pub channel: u8,
    pub flags: PacketFlags,
}

impl<P> TransportEvent<P> {
    pub fn connect(peer: P) -> Self {
        Self {
            kind: EventKind::Connect,
            peer,
            payload: Bytes::new(),
            channel: 0,
            flags: PacketFlags::NONE,
        }
    }

    pub fn disconnect(peer: P) -> Self {
        Self {
            kind: EventKind::Disconnect,
            peer,
            payload: Bytes::new(),
            channel: 0,
            flags: PacketFlags::NONE,
        }
    }

    pub fn message(peer: P, payload: Bytes, channel: u8, flags: PacketFlags) -> Self {
        Self {
            kind: EventKind::Message,
            peer,
            payload,
            channel,
            flags,
        }
    }
}

/// Host-side operations of an unreliable-but-sequenced transport
pub trait Transport {
    type Peer: PeerHandle;

    /// Start connecting to `addr`; completion arrives as a Connect event
    fn connect(&mut self, addr: &str) -> Result<Self::Peer>;

    /// Drop `peer`; the transport reports a Disconnect event for it
    fn disconnect(&mut self, peer: Self::Peer);

    /// Collect pending events, waiting at most `timeout` for the first one
    fn poll(&mut self, timeout: Duration) -> Result<Vec<TransportEvent<Self::Peer>>>;

    /// Queue `payload` for delivery to `peer`
    fn send(
        &mut self,
        peer: Self::Peer,
        payload: Bytes,
        channel: u8,
        flags: PacketFlags,
    ) -> Result<()>;
}
