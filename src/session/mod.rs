//! # Session Identity
//!
//! Maps opaque transport peer handles to small, stable session IDs.
//!
//! IDs live in `[0, capacity)` and are handed out from a FIFO free list, so a
//! released ID is reused as late as possible. Both acquire and release are O(1).

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod table;

pub use table::SessionTable;

/// Small integer identifying one connected peer for the lifetime of its session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl SessionId {
    /// Slot index backing this ID
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for SessionId {
    fn from(id: u32) -> Self {
        SessionId(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
