//! # Host Service
//!
//! Glue between a [`Transport`](crate::transport::Transport) and the dispatch core.
//!
//! ## Components
//! - **Host**: owns the transport, session table, event router and packet
//!   registry; turns each polled transport event into session bookkeeping and
//!   a handler call
//! - **standard_packet_handler**: the default Message handler (decode, process,
//!   record outcome)
//!
//! ## Policies
//! - Connect with a full table: the peer is disconnected, no handler runs
//! - Payload above `wire.max_payload_size`: dropped before decoding
//! - `ProcessOutcome::Error`: the peer is disconnected when
//!   `session.disconnect_on_error` is set

pub mod host;

pub use host::{standard_packet_handler, Host};
