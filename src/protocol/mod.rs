//! # Protocol Dispatch
//!
//! Turns raw payloads into packets and transport events into handler calls.
//!
//! ## Components
//! - **Registry**: wire ID to packet constructor table and the decode protocol
//! - **Router**: one handler per event kind (connect, disconnect, message)
//!
//! ## Decode Flow
//! 1. Read the leading wire ID (empty payload: dropped)
//! 2. Construct the registered packet (unknown ID: dropped)
//! 3. Deserialize its fields (malformed: dropped, never processed)
//! 4. Process it and hand back `Success`, `Failure` or `Error`

pub mod registry;
pub mod router;

pub use registry::PacketRegistry;
pub use router::{EventRouter, PeerEvent};

#[cfg(test)]
mod tests;
