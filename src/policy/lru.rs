//! Least Recently Used replacement.
//!
//! ```text
//!          refer(x)
//!             │
//!      ┌──────┴───────┐
//!      ▼              ▼
//!    hit            miss
//!   move x         full? evict back
//!   to front       admit x at front
//!
//!   front ─► [MRU] ◄──► ... ◄──► [LRU] ◄── back
//! ```
//!
//! One recency list plus an address index. A hit moves the page to the
//! front; a miss at capacity evicts the back. Write references mark the
//! page dirty, and evicting a dirty page bumps the dirty-eviction
//! counter exactly once.

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;
use crate::metrics::{MetricsSnapshot, PolicyMetrics};
use crate::reference::Reference;
use crate::traits::{Outcome, ReplacementPolicy};

#[derive(Debug)]
struct LruEntry {
    addr: u64,
    dirty: bool,
}

/// LRU policy over page identities.
#[derive(Debug)]
pub struct LruPolicy {
    list: IntrusiveList<LruEntry>,
    index: FxHashMap<u64, SlotId>,
    capacity: usize,
    metrics: PolicyMetrics,
}

impl LruPolicy {
    /// Creates an LRU policy with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
            metrics: PolicyMetrics::new(),
        }
    }

    /// Returns `true` if `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.index.contains_key(&addr)
    }

    /// Returns the dirty flag for a resident page.
    pub fn is_dirty(&self, addr: u64) -> Option<bool> {
        let id = *self.index.get(&addr)?;
        self.list.get(id).map(|entry| entry.dirty)
    }

    fn evict_lru(&mut self) {
        if let Some(entry) = self.list.pop_back() {
            self.index.remove(&entry.addr);
            if entry.dirty {
                self.metrics.record_dirty_eviction();
            }
        }
    }

    /// Verifies the index and list agree and the bound holds.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.list.len() != self.index.len() {
            return Err(InvariantError::new("lru: index and list sizes differ"));
        }
        if self.list.len() > self.capacity {
            return Err(InvariantError::new("lru: resident set exceeds capacity"));
        }
        for (&addr, &id) in &self.index {
            match self.list.get(id) {
                Some(entry) if entry.addr == addr => {},
                _ => return Err(InvariantError::new("lru: index points at wrong node")),
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        self.check_invariants().unwrap();
    }
}

impl ReplacementPolicy for LruPolicy {
    fn refer(&mut self, reference: Reference) -> Outcome {
        self.metrics.record_call();
        if self.capacity == 0 {
            return Outcome::Miss;
        }

        if let Some(&id) = self.index.get(&reference.addr) {
            self.list.move_to_front(id);
            if let Some(entry) = self.list.get_mut(id) {
                entry.dirty |= reference.op.is_write();
            }
            self.metrics.record_hit(reference.op);
            return Outcome::Hit;
        }

        if self.list.len() >= self.capacity {
            self.evict_lru();
        }
        let id = self.list.push_front(LruEntry {
            addr: reference.addr,
            dirty: reference.op.is_write(),
        });
        self.index.insert(reference.addr, id);
        Outcome::Miss
    }

    fn summary(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.list.len())
    }

    fn resident_len(&self) -> usize {
        self.list.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
