//! CACHEUS, an expert-weighted hybrid of recency and frequency.
//!
//! One resident set is tracked by two experts at once: an LRU expert
//! (global recency list) and an LFU expert (frequency buckets). Two
//! weights `w_lru + w_lfu = 1` decide which expert picks the victim on
//! an eviction, and each expert keeps a bounded regret history of the
//! identities it evicted:
//!
//! ```text
//!            miss on addr
//!                 │
//!       in exactly one history?
//!        │ yes              │ no
//!        ▼                  ▼
//!   penalize that       weights
//!   expert by α=0.1     unchanged
//!   (floor at 0),
//!   renormalize
//!                 │
//!        full? evict via the heavier expert
//!        (ties go to LRU), victim recorded
//!        in that expert's history only
//! ```
//!
//! A key found in both histories or in neither is no evidence either
//! way; a history entry is consumed the moment it is consulted. The LFU
//! expert breaks frequency ties toward the most recently touched member
//! of the minimum bucket.

use rustc_hash::FxHashMap;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;
use crate::metrics::{MetricsSnapshot, PolicyMetrics};
use crate::reference::Reference;
use crate::traits::{Outcome, ReplacementPolicy};

const LEARNING_RATE: f64 = 0.1;

#[derive(Debug)]
struct EntryMeta {
    lru_id: SlotId,
    dirty: bool,
}

/// CACHEUS policy over page identities.
#[derive(Debug)]
pub struct CacheusPolicy {
    lru: IntrusiveList<u64>,
    freq: FrequencyBuckets<u64>,
    meta: FxHashMap<u64, EntryMeta>,
    lru_history: GhostList<u64>,
    lfu_history: GhostList<u64>,
    w_lru: f64,
    w_lfu: f64,
    capacity: usize,
    metrics: PolicyMetrics,
}

impl CacheusPolicy {
    /// Creates a CACHEUS policy with the given capacity.
    ///
    /// Each regret history holds `ceil(capacity / 10)` identities.
    pub fn new(capacity: usize) -> Self {
        let history_capacity = capacity.div_ceil(10);
        Self {
            lru: IntrusiveList::with_capacity(capacity),
            freq: FrequencyBuckets::with_capacity(capacity),
            meta: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            lru_history: GhostList::new(history_capacity),
            lfu_history: GhostList::new(history_capacity),
            w_lru: 0.5,
            w_lfu: 0.5,
            capacity,
            metrics: PolicyMetrics::new(),
        }
    }

    /// Returns `true` if `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.meta.contains_key(&addr)
    }

    /// Current expert weights as `(w_lru, w_lfu)`.
    pub fn weights(&self) -> (f64, f64) {
        (self.w_lru, self.w_lfu)
    }

    /// Bound of each regret history.
    pub fn history_capacity(&self) -> usize {
        self.lru_history.capacity()
    }

    /// Current regret-history occupancy as `(lru, lfu)`.
    pub fn history_lens(&self) -> (usize, usize) {
        (self.lru_history.len(), self.lfu_history.len())
    }

    /// Consumes any regret record for `addr` and penalizes the expert
    /// that evicted it, if exactly one did.
    fn update_weights(&mut self, addr: u64) {
        let in_lru = self.lru_history.remove(&addr);
        let in_lfu = self.lfu_history.remove(&addr);

        if in_lru && !in_lfu {
            self.w_lru = (self.w_lru - LEARNING_RATE).max(0.0);
            self.w_lfu = 1.0 - self.w_lru;
        } else if in_lfu && !in_lru {
            self.w_lfu = (self.w_lfu - LEARNING_RATE).max(0.0);
            self.w_lru = 1.0 - self.w_lfu;
        }
    }

    fn on_hit(&mut self, reference: Reference) {
        self.metrics.record_hit(reference.op);
        if let Some(entry) = self.meta.get_mut(&reference.addr) {
            self.lru.move_to_front(entry.lru_id);
            entry.dirty |= reference.op.is_write();
        }
        self.freq.touch(&reference.addr);
    }

    fn insert_page(&mut self, reference: Reference) {
        let lru_id = self.lru.push_front(reference.addr);
        self.freq.insert(reference.addr);
        self.meta.insert(
            reference.addr,
            EntryMeta {
                lru_id,
                dirty: reference.op.is_write(),
            },
        );
    }

    fn evict_and_insert(&mut self, reference: Reference) {
        // The heavier expert selects; ties go to the LRU expert.
        let use_lru = self.w_lru >= self.w_lfu;
        let victim = if use_lru {
            self.lru.back().copied()
        } else {
            self.freq.peek_min_recent().copied()
        };
        let Some(victim) = victim else {
            self.insert_page(reference);
            return;
        };

        if let Some(entry) = self.meta.remove(&victim) {
            self.lru.remove(entry.lru_id);
            if entry.dirty {
                self.metrics.record_dirty_eviction();
            }
        }
        self.freq.remove(&victim);

        if use_lru {
            self.lru_history.record(victim);
        } else {
            self.lfu_history.record(victim);
        }

        self.insert_page(reference);
    }

    /// Verifies both expert views agree and the weights are a
    /// distribution.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.meta.len() > self.capacity {
            return Err(InvariantError::new(
                "cacheus: resident set exceeds capacity",
            ));
        }
        if self.meta.len() != self.lru.len() || self.meta.len() != self.freq.len() {
            return Err(InvariantError::new("cacheus: expert views out of sync"));
        }
        if self.w_lru < 0.0 || self.w_lfu < 0.0 {
            return Err(InvariantError::new("cacheus: negative expert weight"));
        }
        if (self.w_lru + self.w_lfu - 1.0).abs() > 1e-9 {
            return Err(InvariantError::new("cacheus: weights do not sum to 1"));
        }
        for (&addr, entry) in &self.meta {
            if self.lru.get(entry.lru_id) != Some(&addr) {
                return Err(InvariantError::new("cacheus: stale recency handle"));
            }
            if !self.freq.contains(&addr) {
                return Err(InvariantError::new(
                    "cacheus: resident page missing from frequency index",
                ));
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.lru.debug_validate_invariants();
        self.freq.debug_validate_invariants();
        self.lru_history.debug_validate_invariants();
        self.lfu_history.debug_validate_invariants();
        self.check_invariants().unwrap();
    }
}

impl ReplacementPolicy for CacheusPolicy {
    fn refer(&mut self, reference: Reference) -> Outcome {
        self.metrics.record_call();
        if self.capacity == 0 {
            return Outcome::Miss;
        }

        if self.contains(reference.addr) {
            self.on_hit(reference);
            return Outcome::Hit;
        }

        self.update_weights(reference.addr);
        if self.meta.len() < self.capacity {
            self.insert_page(reference);
        } else {
            self.evict_and_insert(reference);
        }
        Outcome::Miss
    }

    fn summary(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.meta.len())
    }

    fn resident_len(&self) -> usize {
        self.meta.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(cacheus: &mut CacheusPolicy, addrs: impl IntoIterator<Item = u64>) {
        for addr in addrs {
            cacheus.refer(Reference::read(addr));
            cacheus.debug_validate_invariants();
        }
    }

    #[test]
    fn starts_balanced_and_fills_without_eviction() {
        let mut cacheus = CacheusPolicy::new(4);
        assert_eq!(cacheus.weights(), (0.5, 0.5));
        read_all(&mut cacheus, 1..=4);
        assert_eq!(cacheus.resident_len(), 4);
        assert_eq!(cacheus.weights(), (0.5, 0.5));
    }

    #[test]
    fn balanced_weights_follow_lru_expert() {
        let mut cacheus = CacheusPolicy::new(2);
        read_all(&mut cacheus, [1, 2]);
        cacheus.refer(Reference::read(1));

        // Tie goes to LRU, whose victim is 2.
        cacheus.refer(Reference::read(3));
        assert!(cacheus.contains(1));
        assert!(!cacheus.contains(2));
        assert!(cacheus.contains(3));
        cacheus.debug_validate_invariants();
    }

    #[test]
    fn lru_regret_shifts_weight_to_lfu() {
        let mut cacheus = CacheusPolicy::new(10);
        read_all(&mut cacheus, 1..=11);

        // 1 was evicted by the LRU expert; missing on it again is
        // evidence against that expert.
        cacheus.refer(Reference::read(1));
        let (w_lru, w_lfu) = cacheus.weights();
        assert!((w_lru - 0.4).abs() < 1e-12);
        assert!((w_lfu - 0.6).abs() < 1e-12);
        cacheus.debug_validate_invariants();
    }

    #[test]
    fn repeated_regret_floors_lru_weight_at_zero() {
        let mut cacheus = CacheusPolicy::new(50);
        read_all(&mut cacheus, 1..=55);
        assert_eq!(cacheus.history_capacity(), 5);

        // Victims 1..=5 all sit in the LRU expert's history. Each
        // re-reference penalizes it by one step; after five steps the
        // weight has walked 0.5 -> 0.0.
        for (i, addr) in (1..=5u64).enumerate() {
            cacheus.refer(Reference::read(addr));
            let expected = 0.5 - 0.1 * (i as f64 + 1.0);
            let (w_lru, w_lfu) = cacheus.weights();
            assert!((w_lru - expected).abs() < 1e-9);
            assert!((w_lfu - (1.0 - expected)).abs() < 1e-9);
            cacheus.debug_validate_invariants();
        }
        assert_eq!(cacheus.weights().0, 0.0);
    }

    #[test]
    fn consumed_history_entry_penalizes_only_once() {
        let mut cacheus = CacheusPolicy::new(10);
        read_all(&mut cacheus, 1..=11);
        cacheus.refer(Reference::read(1));
        let after_first = cacheus.weights();

        // 1's regret record was consumed; a later miss on it (now
        // evicted by the LFU expert or absent from both histories) must
        // not replay the LRU penalty.
        read_all(&mut cacheus, 20..=23);
        cacheus.refer(Reference::read(1));
        assert!(cacheus.weights().0 >= after_first.0 - LEARNING_RATE);
        cacheus.debug_validate_invariants();
    }

    #[test]
    fn lfu_expert_evicts_min_frequency_most_recent() {
        let mut cacheus = CacheusPolicy::new(10);
        read_all(&mut cacheus, 1..=11);
        // Shift weight toward the LFU expert.
        cacheus.refer(Reference::read(1));
        assert!(cacheus.weights().1 > cacheus.weights().0);

        // Every resident is at frequency 1, so the LFU victim is the
        // most recently admitted page: 1 itself.
        cacheus.refer(Reference::read(30));
        assert!(!cacheus.contains(1));
        assert!(cacheus.contains(30));
        cacheus.debug_validate_invariants();
    }

    #[test]
    fn dirty_eviction_counts_once() {
        let mut cacheus = CacheusPolicy::new(2);
        cacheus.refer(Reference::write(1));
        cacheus.refer(Reference::read(2));
        cacheus.refer(Reference::read(2));
        cacheus.refer(Reference::read(3));

        // LRU victim was dirty page 1.
        assert_eq!(cacheus.summary().dirty_evictions, 1);
        cacheus.refer(Reference::read(4));
        assert_eq!(cacheus.summary().dirty_evictions, 1);
    }

    #[test]
    fn zero_capacity_admits_nothing() {
        let mut cacheus = CacheusPolicy::new(0);
        assert_eq!(cacheus.refer(Reference::write(1)), Outcome::Miss);
        assert_eq!(cacheus.refer(Reference::write(1)), Outcome::Miss);
        assert_eq!(cacheus.resident_len(), 0);
        assert_eq!(cacheus.summary().hits, 0);
        assert_eq!(cacheus.weights(), (0.5, 0.5));
    }
}
