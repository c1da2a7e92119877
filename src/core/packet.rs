//! # Packets
//!
//! A packet is one typed wire message. Every packet type can be built with no
//! arguments, reads and writes its own fields through the byte streams, and
//! reports a [`ProcessOutcome`] once handled.
//!
//! ## Wire Format
//! ```text
//! [WireId(1)] [Fields(N)]
//! ```
//! The leading wire ID is written and consumed by the registry; packet
//! implementations only deal with their own fields.

use std::any::Any;
use std::fmt::Debug;

use crate::core::stream::{ReadStream, WriteStream};
use crate::error::Result;

/// One-byte tag identifying a packet type on the wire
pub type WireId = u8;

/// Result of handling a decoded packet.
///
/// `Failure` is an application-level rejection the peer can recover from.
/// `Error` means the peer is misbehaving and usually warrants a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessOutcome {
    Success,
    Failure,
    Error,
}

impl ProcessOutcome {
    pub fn is_success(self) -> bool {
        self == ProcessOutcome::Success
    }

    pub fn name(self) -> &'static str {
        match self {
            ProcessOutcome::Success => "success",
            ProcessOutcome::Failure => "failure",
            ProcessOutcome::Error => "error",
        }
    }
}

/// Upcast helper so `dyn Packet` values can be downcast to their concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A self-describing wire message
pub trait Packet: AsAny + Debug + Send {
    /// Write this packet's fields (not the wire ID)
    fn serialize(&self, stream: &mut WriteStream) -> Result<()>;

    /// Overwrite this packet's fields from `stream`
    fn deserialize(&mut self, stream: &mut ReadStream) -> Result<()>;

    /// Act on a freshly decoded packet
    fn process(&mut self) -> ProcessOutcome;
}

impl dyn Packet {
    /// Borrow the concrete packet if it is a `T`
    pub fn downcast_ref<T: Packet>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn is<T: Packet>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}
