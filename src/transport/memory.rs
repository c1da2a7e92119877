//! In-process transport
//!
//! Deterministic stand-in for a network host. Tests inject connect, message
//! and disconnect events; everything the host sends or drops is recorded for
//! inspection. `poll` never blocks.

use bytes::Bytes;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;
use tracing::trace;

use crate::error::{ProtocolError, Result};
use crate::transport::{PacketFlags, Transport, TransportEvent};

/// Peer handle issued by [`MemoryTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerToken(pub u64);

impl fmt::Display for PeerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// A payload handed to [`Transport::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub peer: PeerToken,
    pub payload: Bytes,
    pub channel: u8,
    pub flags: PacketFlags,
}

#[derive(Debug, Default)]
pub struct MemoryTransport {
    next_token: u64,
    connected: HashSet<PeerToken>,
    pending: VecDeque<TransportEvent<PeerToken>>,
    sent: Vec<SentFrame>,
    disconnected: Vec<PeerToken>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a remote peer completing its handshake
    pub fn inject_connect(&mut self) -> PeerToken {
        let peer = PeerToken(self.next_token);
        self.next_token += 1;
        self.connected.insert(peer);
        self.pending.push_back(TransportEvent::connect(peer));
        peer
    }

    /// Simulate `peer` sending `payload`
    pub fn inject_message(&mut self, peer: PeerToken, payload: impl Into<Bytes>, channel: u8) {
        self.pending.push_back(TransportEvent::message(
            peer,
            payload.into(),
            channel,
            PacketFlags::RELIABLE,
        ));
    }

    /// Simulate `peer` hanging up
    pub fn inject_disconnect(&mut self, peer: PeerToken) {
        self.connected.remove(&peer);
        self.pending.push_back(TransportEvent::disconnect(peer));
    }

    pub fn is_connected(&self, peer: PeerToken) -> bool {
        self.connected.contains(&peer)
    }

    /// Frames sent so far
    pub fn sent(&self) -> &[SentFrame] {
        &self.sent
    }

    /// Drain the recorded frames
    pub fn take_sent(&mut self) -> Vec<SentFrame> {
        std::mem::take(&mut self.sent)
    }

    /// Peers the host asked to disconnect, in order
    pub fn disconnected(&self) -> &[PeerToken] {
        &self.disconnected
    }

    /// Events waiting for the next poll
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Transport for MemoryTransport {
    type Peer = PeerToken;

    fn connect(&mut self, addr: &str) -> Result<PeerToken> {
        if addr.is_empty() {
            return Err(ProtocolError::TransportError(
                "cannot connect to an empty address".to_string(),
            ));
        }
        let peer = self.inject_connect();
        trace!(%peer, addr, "Loopback connection established");
        Ok(peer)
    }

    fn disconnect(&mut self, peer: PeerToken) {
        if self.connected.remove(&peer) {
            self.disconnected.push(peer);
            self.pending.push_back(TransportEvent::disconnect(peer));
        }
    }

    fn poll(&mut self, _timeout: Duration) -> Result<Vec<TransportEvent<PeerToken>>> {
        Ok(self.pending.drain(..).collect())
    }

    fn send(
        &mut self,
        peer: PeerToken,
        payload: Bytes,
        channel: u8,
        flags: PacketFlags,
    ) -> Result<()> {
        if !self.connected.contains(&peer) {
            return Err(ProtocolError::TransportError(format!(
                "{peer} is not connected"
            )));
        }
        self.sent.push(SentFrame {
            peer,
            payload,
            channel,
            flags,
        });
        Ok(())
    }
}
