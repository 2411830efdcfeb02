//! Per-policy counters and the snapshot handed back to callers.
//!
//! Counters are instance-scoped and monotonically increasing; a snapshot
//! freezes them together with the resident size so ratios stay
//! consistent even while the policy keeps running.

use crate::reference::OpKind;

/// Live counters owned by a policy instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyMetrics {
    calls: u64,
    hits: u64,
    read_hits: u64,
    write_hits: u64,
    evicted_dirty: u64,
}

impl PolicyMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one processed reference. Called once per `refer`, hit or miss.
    pub fn record_call(&mut self) {
        self.calls += 1;
    }

    /// Counts a hit, attributed to the reference's operation kind.
    pub fn record_hit(&mut self, op: OpKind) {
        self.hits += 1;
        match op {
            OpKind::Read => self.read_hits += 1,
            OpKind::Write => self.write_hits += 1,
        }
    }

    /// Counts the physical eviction of a dirty resident page.
    pub fn record_dirty_eviction(&mut self) {
        self.evicted_dirty += 1;
    }

    /// Freezes the counters into a [`MetricsSnapshot`].
    pub fn snapshot(&self, capacity: usize, resident: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls,
            hits: self.hits,
            read_hits: self.read_hits,
            write_hits: self.write_hits,
            dirty_evictions: self.evicted_dirty,
            resident,
            capacity,
        }
    }
}

/// Point-in-time view of a policy's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total references processed.
    pub calls: u64,
    /// References that found their page resident.
    pub hits: u64,
    /// Hits on read references.
    pub read_hits: u64,
    /// Hits on write references.
    pub write_hits: u64,
    /// Dirty resident pages physically evicted.
    pub dirty_evictions: u64,
    /// Resident pages at snapshot time.
    pub resident: usize,
    /// Configured capacity.
    pub capacity: usize,
}

impl MetricsSnapshot {
    /// References that missed.
    pub fn misses(&self) -> u64 {
        self.calls - self.hits
    }

    /// Overall hit ratio; `0.0` before any reference is processed.
    pub fn hit_ratio(&self) -> f64 {
        ratio(self.hits, self.calls)
    }

    /// Read-hit ratio over all calls; `0.0` before any reference.
    pub fn read_hit_ratio(&self) -> f64 {
        ratio(self.read_hits, self.calls)
    }

    /// Write-hit ratio over all calls; `0.0` before any reference.
    pub fn write_hit_ratio(&self) -> f64 {
        ratio(self.write_hits, self.calls)
    }
}

fn ratio(numer: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        numer as f64 / denom as f64
    }
}
