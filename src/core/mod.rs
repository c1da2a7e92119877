//! # Core Codec Components
//!
//! Low-level byte streams and the packet capability every wire message implements.
//!
//! ## Components
//! - **Stream**: bounds-checked `WriteStream` / `ReadStream`
//! - **Packet**: the `Packet` trait, wire IDs and process outcomes
//!
//! ## Wire Format
//! ```text
//! [WireId(1)] [Scalar fields: fixed width LE] [Strings: u64 LE length + bytes]
//! ```
//!
//! ## Security
//! - Reads never pass the end of the buffer
//! - Length prefixes are validated before allocation

pub mod packet;
pub mod stream;
