//! # wirebind
//!
//! Message framing, packet dispatch and session identity for client/server
//! applications running over an ENet-style transport.
//!
//! ## Layers
//! - [`core`]: bounds-checked byte streams and the [`Packet`] trait
//! - [`protocol`]: the wire ID [`PacketRegistry`] and the [`EventRouter`]
//! - [`session`]: the fixed-capacity [`SessionTable`]
//! - [`transport`]: the [`Transport`] contract and an in-memory implementation
//! - [`service`]: the [`Host`] adapter driving everything from one poll loop
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wirebind::config::HostConfig;
//! use wirebind::core::stream::{ReadStream, WriteStream};
//! use wirebind::transport::memory::MemoryTransport;
//! use wirebind::{Host, Packet, PacketRegistry, ProcessOutcome, Result};
//!
//! #[derive(Debug, Default)]
//! struct Chat {
//!     text: String,
//! }
//!
//! impl Packet for Chat {
//!     fn serialize(&self, stream: &mut WriteStream) -> Result<()> {
//!         stream.write_string(&self.text);
//!         Ok(())
//!     }
//!
//!     fn deserialize(&mut self, stream: &mut ReadStream) -> Result<()> {
//!         self.text = stream.read_string()?;
//!         Ok(())
//!     }
//!
//!     fn process(&mut self) -> ProcessOutcome {
//!         ProcessOutcome::Success
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut registry = PacketRegistry::new();
//! registry.register::<Chat>(0x01)?;
//! let registry = Arc::new(registry);
//!
//! let mut host = Host::new(MemoryTransport::new(), registry.clone(), HostConfig::default());
//! let peer = host.transport_mut().inject_connect();
//! let hello = registry.encode(&Chat { text: "hello".into() })?;
//! host.transport_mut().inject_message(peer, hello, 0);
//!
//! assert_eq!(host.poll(Duration::ZERO)?, 2);
//! assert_eq!(host.metrics().snapshot().packets_succeeded, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod session;
pub mod transport;
pub mod utils;

pub use crate::core::packet::{Packet, ProcessOutcome, WireId};
pub use crate::core::stream::{ReadStream, WriteStream};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::{EventRouter, PacketRegistry, PeerEvent};
pub use crate::service::Host;
pub use crate::session::{SessionId, SessionTable};
pub use crate::transport::{EventKind, PacketFlags, PeerHandle, Transport, TransportEvent};
