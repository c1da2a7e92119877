use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

use crate::core::packet::ProcessOutcome;
use crate::session::SessionId;
use crate::transport::{EventKind, PacketFlags, PeerHandle, TransportEvent};

/// A transport event resolved to its session, as seen by handlers.
///
/// Handlers get it by mutable reference: they may take the payload without
/// copying and record the outcome of processing it.
#[derive(Debug, Clone)]
pub struct PeerEvent<P> {
    pub kind: EventKind,
    pub session: SessionId,
    pub peer: P,
    pub payload: Bytes,
    pub channel: u8,
    pub flags: PacketFlags,
    /// Set by message handlers once a packet has been processed
    pub outcome: Option<ProcessOutcome>,
}

impl<P> PeerEvent<P> {
    pub fn new(session: SessionId, event: TransportEvent<P>) -> Self {
        Self {
            kind: event.kind,
            session,
            peer: event.peer,
            payload: event.payload,
            channel: event.channel,
            flags: event.flags,
            outcome: None,
        }
    }

    /// Take the payload, leaving an empty buffer behind
    pub fn take_payload(&mut self) -> Bytes {
        std::mem::take(&mut self.payload)
    }
}

type HandlerFn<P> = dyn FnMut(&mut PeerEvent<P>) + Send + 'static;

/// Routes each event kind to at most one handler.
///
/// Registering a handler replaces the previous one for that kind. Events of a
/// kind with no handler are dropped silently.
pub struct EventRouter<P: PeerHandle> {
    handlers: HashMap<EventKind, Box<HandlerFn<P>>>,
}

impl<P: PeerHandle> Default for EventRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PeerHandle> EventRouter<P> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: FnMut(&mut PeerEvent<P>) + Send + 'static,
    {
        if self.handlers.insert(kind, Box::new(handler)).is_some() {
            trace!(?kind, "Replaced event handler");
        }
        self
    }

    /// Run the handler for `event.kind`, if any. Returns whether one ran.
    pub fn dispatch(&mut self, event: &mut PeerEvent<P>) -> bool {
        match self.handlers.get_mut(&event.kind) {
            Some(handler) => {
                handler(event);
                true
            }
            None => {
                trace!(kind = ?event.kind, session = %event.session, "No handler registered");
                false
            }
        }
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Remove the handler for `kind`
    pub fn clear(&mut self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }
}

impl<P: PeerHandle> fmt::Debug for EventRouter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
