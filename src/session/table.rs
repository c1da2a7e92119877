use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace, warn};

use crate::session::SessionId;
use crate::transport::PeerHandle;

/// One fixed position in the table, free or bound to a peer
#[derive(Debug, Clone, Copy)]
struct Slot<P> {
    in_use: bool,
    peer: Option<P>,
}

impl<P> Slot<P> {
    fn empty() -> Self {
        Self {
            in_use: false,
            peer: None,
        }
    }
}

/// Fixed-capacity session ID allocator
///
/// Uses a VecDeque free list for O(1) acquire/release and a reverse map for
/// O(1) peer lookups. Released IDs go to the back of the queue.
#[derive(Debug, Clone)]
pub struct SessionTable<P: PeerHandle> {
    slots: Vec<Slot<P>>,
    free: VecDeque<SessionId>,
    by_peer: HashMap<P, SessionId>,
}

impl<P: PeerHandle> SessionTable<P> {
    /// Create a table with `capacity` free IDs
    pub fn new(capacity: u32) -> Self {
        let mut table = Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            by_peer: HashMap::new(),
        };
        table.setup(capacity);
        table
    }

    /// Reset to `capacity` empty slots with every ID free, in ascending order.
    ///
    /// Any live bindings are dropped.
    pub fn setup(&mut self, capacity: u32) {
        self.slots.clear();
        self.slots.resize(capacity as usize, Slot::empty());
        self.free.clear();
        self.free.extend((0..capacity).map(SessionId));
        self.by_peer.clear();
        self.by_peer.reserve(capacity as usize);
        debug!(capacity, "Session table initialized");
    }

    /// Bind `peer` to the next free ID.
    ///
    /// Returns `None` when every ID is in use. Acquiring twice for the same
    /// peer without a release in between is a caller error and is refused.
    pub fn acquire(&mut self, peer: P) -> Option<SessionId> {
        if let Some(existing) = self.by_peer.get(&peer) {
            warn!(?peer, session = %existing, "Peer already holds a session");
            return None;
        }

        let id = self.free.pop_front()?;
        let slot = &mut self.slots[id.index()];
        slot.in_use = true;
        slot.peer = Some(peer);
        self.by_peer.insert(peer, id);

        trace!(?peer, session = %id, "Session acquired");
        Some(id)
    }

    pub fn lookup_by_peer(&self, peer: &P) -> Option<SessionId> {
        self.by_peer.get(peer).copied()
    }

    pub fn lookup_by_id(&self, id: SessionId) -> Option<P> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.in_use)
            .and_then(|slot| slot.peer)
    }

    /// Unbind `id` and return it to the free list.
    ///
    /// Out-of-range or unbound IDs are ignored. Returns the peer that held it.
    pub fn release(&mut self, id: SessionId) -> Option<P> {
        let slot = self.slots.get_mut(id.index())?;
        if !slot.in_use {
            return None;
        }

        let peer = slot.peer.take();
        slot.in_use = false;
        if let Some(peer) = peer.as_ref() {
            self.by_peer.remove(peer);
        }
        self.free.push_back(id);

        trace!(session = %id, "Session released");
        peer
    }

    /// Release whatever ID `peer` holds
    pub fn release_peer(&mut self, peer: &P) -> Option<SessionId> {
        let id = self.lookup_by_peer(peer)?;
        self.release(id);
        Some(id)
    }

    /// Live IDs in ascending order
    pub fn active_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.by_peer.values().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn active_count(&self) -> usize {
        self.by_peer.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_start_ascending() {
        let mut table = SessionTable::new(4);
        let ids: Vec<_> = (10u64..14).filter_map(|p| table.acquire(p)).collect();
        assert_eq!(ids, vec![SessionId(0), SessionId(1), SessionId(2), SessionId(3)]);
        assert!(table.is_full());
    }

    #[test]
    fn capacity_exhaustion_and_reuse() {
        let mut table = SessionTable::new(2);
        assert_eq!(table.acquire(1u64), Some(SessionId(0)));
        assert_eq!(table.acquire(2u64), Some(SessionId(1)));
        assert_eq!(table.acquire(3u64), None);

        assert_eq!(table.release(SessionId(0)), Some(1u64));
        assert_eq!(table.acquire(3u64), Some(SessionId(0)));
        assert_eq!(table.lookup_by_peer(&1u64), None);
        assert_eq!(table.lookup_by_peer(&3u64), Some(SessionId(0)));
    }

    #[test]
    fn released_ids_are_reused_fifo() {
        let mut table = SessionTable::new(4);
        for peer in 0u64..4 {
            table.acquire(peer);
        }
        table.release(SessionId(2));
        table.release(SessionId(0));

        assert_eq!(table.acquire(100u64), Some(SessionId(2)));
        assert_eq!(table.acquire(101u64), Some(SessionId(0)));
    }

    #[test]
    fn invalid_release_is_noop() {
        let mut table = SessionTable::new(2);
        assert_eq!(table.release(SessionId(0)), None);
        assert_eq!(table.release(SessionId(7)), None);
        assert_eq!(table.release(SessionId(u32::MAX)), None);

        // A no-op release must not grow the free list
        let ids: HashSet<_> = (0u64..3).filter_map(|p| table.acquire(p)).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn double_release_returns_id_once() {
        let mut table = SessionTable::new(1);
        let id = table.acquire(5u64).expect("free slot");
        assert_eq!(table.release(id), Some(5));
        assert_eq!(table.release(id), None);

        assert_eq!(table.acquire(6u64), Some(id));
        assert_eq!(table.acquire(7u64), None);
    }

    #[test]
    fn double_acquire_is_refused() {
        let mut table = SessionTable::new(4);
        let id = table.acquire(9u64).expect("free slot");
        assert_eq!(table.acquire(9u64), None);
        assert_eq!(table.active_count(), 1);
        assert_eq!(table.lookup_by_peer(&9u64), Some(id));
    }

    #[test]
    fn setup_resets_bindings() {
        let mut table = SessionTable::new(2);
        table.acquire(1u64);
        table.acquire(2u64);

        table.setup(3);
        assert_eq!(table.capacity(), 3);
        assert_eq!(table.active_count(), 0);
        assert_eq!(table.lookup_by_peer(&1u64), None);
        assert_eq!(table.acquire(1u64), Some(SessionId(0)));
    }

    #[test]
    fn release_by_peer_and_active_ids() {
        let mut table = SessionTable::new(3);
        table.acquire(1u64);
        table.acquire(2u64);
        table.acquire(3u64);

        assert_eq!(table.release_peer(&2u64), Some(SessionId(1)));
        assert_eq!(table.release_peer(&2u64), None);
        assert_eq!(table.active_ids(), vec![SessionId(0), SessionId(2)]);
        assert_eq!(table.lookup_by_id(SessionId(1)), None);
    }

    #[test]
    fn zero_capacity_is_always_full() {
        let mut table: SessionTable<u64> = SessionTable::new(0);
        assert!(table.is_full());
        assert_eq!(table.acquire(1), None);
    }
}
