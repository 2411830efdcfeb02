//! Bounded recency list of evicted-key identities.
//!
//! Adaptive policies keep "ghost" records of keys that recently left the
//! resident set: ARC's B1/B2 and the CACHEUS regret histories are both
//! instances of this structure. Only identities are stored; a ghost hit
//! is consumed by the caller as an adaptation signal.
//!
//! ```text
//!   index: FxHashMap<K, SlotId>      list: IntrusiveList<K>
//!   ┌─────────┬────────┐            head ─► [A] ◄──► [B] ◄──► [C] ◄── tail
//!   │  key A  │  id_0  │               newest                  oldest
//!   │  key B  │  id_1  │
//!   └─────────┴────────┘
//! ```
//!
//! `record` pushes at the newest end and drops the oldest entry once the
//! configured bound is reached. A zero-capacity ghost list is a no-op.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;

/// Bounded MRU list of key identities (no values).
#[derive(Debug)]
pub struct GhostList<K> {
    list: IntrusiveList<K>,
    index: FxHashMap<K, SlotId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a ghost list holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    /// Returns the configured bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as newest, dropping the oldest entry if at the bound.
    ///
    /// Re-recording a present key moves it to the newest position.
    pub fn record(&mut self, key: K) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return;
        }

        if self.list.len() >= self.capacity
            && let Some(old_key) = self.list.pop_back()
        {
            self.index.remove(&old_key);
        }

        let id = self.list.push_front(key.clone());
        self.index.insert(key, id);
    }

    /// Removes `key`; returns `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    /// Removes and returns the oldest tracked key.
    pub fn pop_oldest(&mut self) -> Option<K> {
        let key = self.list.pop_back()?;
        self.index.remove(&key);
        Some(key)
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.list.len() <= self.capacity);
        for &id in self.index.values() {
            assert!(self.list.contains(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_bounds() {
        let mut ghost = GhostList::new(2);
        ghost.record(1u64);
        ghost.record(2);
        ghost.record(3);

        assert_eq!(ghost.len(), 2);
        assert!(!ghost.contains(&1));
        assert!(ghost.contains(&2));
        assert!(ghost.contains(&3));
        ghost.debug_validate_invariants();
    }

    #[test]
    fn re_record_refreshes_position() {
        let mut ghost = GhostList::new(2);
        ghost.record(1u64);
        ghost.record(2);
        ghost.record(1);
        ghost.record(3);

        // 2 was oldest after the refresh of 1.
        assert!(ghost.contains(&1));
        assert!(!ghost.contains(&2));
        assert!(ghost.contains(&3));
    }

    #[test]
    fn remove_and_pop_oldest() {
        let mut ghost = GhostList::new(3);
        ghost.record(1u64);
        ghost.record(2);
        ghost.record(3);

        assert!(ghost.remove(&2));
        assert!(!ghost.remove(&2));
        assert_eq!(ghost.pop_oldest(), Some(1));
        assert_eq!(ghost.pop_oldest(), Some(3));
        assert_eq!(ghost.pop_oldest(), None);
        ghost.debug_validate_invariants();
    }

    #[test]
    fn zero_capacity_is_noop() {
        let mut ghost = GhostList::new(0);
        ghost.record(1u64);
        assert!(ghost.is_empty());
        assert!(!ghost.contains(&1));
        assert_eq!(ghost.pop_oldest(), None);
    }
}
