//! # Error Types
//!
//! Error handling for the framing, dispatch and session layers.
//!
//! Every fallible operation in the crate returns [`Result`], and every failure
//! has a defined non-fatal outcome: a host polling loop logs the error, drops the
//! offending payload or peer, and keeps going.
//!
//! ## Error Categories
//! - **Decode Errors**: truncated buffers, bad scalar values, invalid UTF-8
//! - **Registry Errors**: unknown or duplicate wire IDs, unregistered packet types
//! - **Session Errors**: operations against IDs that are not bound
//! - **Transport Errors**: failures reported by the underlying transport
//! - **Configuration Errors**: unreadable or invalid config files
//!
//! ## Example Usage
//! ```rust
//! use wirebind::core::stream::ReadStream;
//! use wirebind::error::{ProtocolError, Result};
//!
//! fn read_header(bytes: &[u8]) -> Result<(u8, u32)> {
//!     let mut stream = ReadStream::from_slice(bytes);
//!     let kind = stream.read::<u8>()?;
//!     let len = stream.read::<u32>()?;
//!     Ok((kind, len))
//! }
//!
//! match read_header(&[0x01, 0x02]) {
//!     Err(ProtocolError::UnexpectedEof { requested, available }) => {
//!         assert_eq!((requested, available), (4, 1));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

use crate::core::packet::WireId;
use crate::session::SessionId;

// ProtocolError is the primary error type for all crate operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of stream: needed {requested} bytes, {available} available")]
    UnexpectedEof { requested: usize, available: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    #[error("Empty payload")]
    EmptyPayload,

    #[error("Unknown wire id: {0:#04x}")]
    UnknownWireId(WireId),

    #[error("Wire id already registered: {0:#04x}")]
    DuplicateWireId(WireId),

    #[error("Packet type not registered: {0}")]
    UnregisteredPacket(&'static str),

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
