//! Least Frequently Used replacement.
//!
//! Every resident page carries an access count starting at 1 on
//! admission. A miss at capacity evicts from the minimum-frequency
//! bucket, breaking ties toward the member that has sat there longest.
//! Counts are not retained across eviction; a readmitted page starts
//! over at 1.

use rustc_hash::FxHashSet;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::error::InvariantError;
use crate::metrics::{MetricsSnapshot, PolicyMetrics};
use crate::reference::Reference;
use crate::traits::{Outcome, ReplacementPolicy};

/// LFU policy over page identities.
#[derive(Debug)]
pub struct LfuPolicy {
    freq: FrequencyBuckets<u64>,
    dirty: FxHashSet<u64>,
    capacity: usize,
    metrics: PolicyMetrics,
}

impl LfuPolicy {
    /// Creates an LFU policy with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            freq: FrequencyBuckets::with_capacity(capacity),
            dirty: FxHashSet::default(),
            capacity,
            metrics: PolicyMetrics::new(),
        }
    }

    /// Returns `true` if `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.freq.contains(&addr)
    }

    /// Returns the access count for a resident page.
    pub fn frequency(&self, addr: u64) -> Option<u64> {
        self.freq.frequency(&addr)
    }

    fn evict_min(&mut self) {
        if let Some((addr, _)) = self.freq.pop_min_oldest()
            && self.dirty.remove(&addr)
        {
            self.metrics.record_dirty_eviction();
        }
    }

    /// Verifies the frequency index and dirty set agree with the bound.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.freq.len() > self.capacity {
            return Err(InvariantError::new("lfu: resident set exceeds capacity"));
        }
        for addr in &self.dirty {
            if !self.freq.contains(addr) {
                return Err(InvariantError::new("lfu: dirty flag on non-resident page"));
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.freq.debug_validate_invariants();
        self.check_invariants().unwrap();
    }
}

impl ReplacementPolicy for LfuPolicy {
    fn refer(&mut self, reference: Reference) -> Outcome {
        self.metrics.record_call();
        if self.capacity == 0 {
            return Outcome::Miss;
        }

        if self.freq.contains(&reference.addr) {
            self.freq.touch(&reference.addr);
            if reference.op.is_write() {
                self.dirty.insert(reference.addr);
            }
            self.metrics.record_hit(reference.op);
            return Outcome::Hit;
        }

        if self.freq.len() >= self.capacity {
            self.evict_min();
        }
        self.freq.insert(reference.addr);
        if reference.op.is_write() {
            self.dirty.insert(reference.addr);
        }
        Outcome::Miss
    }

    fn summary(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.freq.len())
    }

    fn resident_len(&self) -> usize {
        self.freq.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
