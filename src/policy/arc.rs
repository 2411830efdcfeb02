//! Adaptive Replacement Cache.
//!
//! Four lists share one capacity `c`. T1 and T2 hold resident pages
//! (recency and frequency respectively); B1 and B2 are ghost lists
//! remembering the identities of pages recently evicted from each side.
//! The adaptation target `p` is the desired size of T1 and moves toward
//! whichever ghost list is producing hits.
//!
//! ```text
//!             resident (≤ c pages)              ghosts (identities)
//!   ┌───────────────┬────────────────┐   ┌──────────┬──────────┐
//!   │      T1       │       T2       │   │    B1    │    B2    │
//!   │ seen once     │ seen ≥ twice   │   │ from T1  │ from T2  │
//!   └───────▲───────┴────────▲───────┘   └────┬─────┴────┬─────┘
//!           │                │                │          │
//!           │   hit in T1 ───┘         hit ───┘ p += Δ   └── hit: p -= Δ
//!           │
//!         new page (miss everywhere)
//! ```
//!
//! `p` starts at 0 and adapts by `max(1, |other ghost| / |hit ghost|)`
//! per ghost hit, clamped to `[0, c]`. REPLACE evicts from T1 when
//! `|T1| > p` (or `|T1| == p` on a B2 hit), otherwise from T2, falling
//! back to the other resident list when the chosen one is empty.

use rustc_hash::FxHashMap;

use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;
use crate::metrics::{MetricsSnapshot, PolicyMetrics};
use crate::reference::Reference;
use crate::traits::{Outcome, ReplacementPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResidentList {
    T1,
    T2,
}

#[derive(Debug, Clone, Copy)]
struct ResidentEntry {
    list: ResidentList,
    id: SlotId,
    dirty: bool,
}

/// ARC policy over page identities.
#[derive(Debug)]
pub struct ArcPolicy {
    t1: IntrusiveList<u64>,
    t2: IntrusiveList<u64>,
    b1: GhostList<u64>,
    b2: GhostList<u64>,
    residents: FxHashMap<u64, ResidentEntry>,
    p: usize,
    capacity: usize,
    metrics: PolicyMetrics,
}

impl ArcPolicy {
    /// Creates an ARC policy with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            t1: IntrusiveList::with_capacity(capacity),
            t2: IntrusiveList::with_capacity(capacity),
            b1: GhostList::new(capacity),
            b2: GhostList::new(capacity),
            residents: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            p: 0,
            capacity,
            metrics: PolicyMetrics::new(),
        }
    }

    /// Current adaptation target for the size of T1.
    pub fn p(&self) -> usize {
        self.p
    }

    /// Resident pages on the recency side.
    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    /// Resident pages on the frequency side.
    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    /// Ghost identities remembered from T1 evictions.
    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Ghost identities remembered from T2 evictions.
    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// Returns `true` if `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.residents.contains_key(&addr)
    }

    /// Evicts the LRU page of `list` into the matching ghost list.
    fn evict_from(&mut self, list: ResidentList) {
        let evicted = match list {
            ResidentList::T1 => self.t1.pop_back(),
            ResidentList::T2 => self.t2.pop_back(),
        };
        let Some(addr) = evicted else { return };
        if let Some(entry) = self.residents.remove(&addr)
            && entry.dirty
        {
            self.metrics.record_dirty_eviction();
        }
        match list {
            ResidentList::T1 => self.b1.record(addr),
            ResidentList::T2 => self.b2.record(addr),
        }
    }

    /// REPLACE step: frees one resident slot before an admission.
    fn replace(&mut self, hit_in_b2: bool) {
        let t1_len = self.t1.len();
        if t1_len > 0 && (t1_len > self.p || (hit_in_b2 && t1_len == self.p)) {
            self.evict_from(ResidentList::T1);
        } else if !self.t2.is_empty() {
            self.evict_from(ResidentList::T2);
        } else if t1_len > 0 {
            self.evict_from(ResidentList::T1);
        }
    }

    fn admit_t2(&mut self, reference: Reference) {
        let id = self.t2.push_front(reference.addr);
        self.residents.insert(
            reference.addr,
            ResidentEntry {
                list: ResidentList::T2,
                id,
                dirty: reference.op.is_write(),
            },
        );
    }

    fn on_resident_hit(&mut self, reference: Reference, entry: ResidentEntry) {
        match entry.list {
            ResidentList::T1 => {
                // First re-reference promotes to the frequency side.
                self.t1.remove(entry.id);
                let id = self.t2.push_front(reference.addr);
                self.residents.insert(
                    reference.addr,
                    ResidentEntry {
                        list: ResidentList::T2,
                        id,
                        dirty: entry.dirty || reference.op.is_write(),
                    },
                );
            },
            ResidentList::T2 => {
                self.t2.move_to_front(entry.id);
                if let Some(stored) = self.residents.get_mut(&reference.addr) {
                    stored.dirty |= reference.op.is_write();
                }
            },
        }
        self.metrics.record_hit(reference.op);
    }

    fn on_b1_hit(&mut self, reference: Reference) {
        let delta = (self.b2.len() / self.b1.len().max(1)).max(1);
        self.p = (self.p + delta).min(self.capacity);
        self.replace(false);
        self.b1.remove(&reference.addr);
        self.admit_t2(reference);
    }

    fn on_b2_hit(&mut self, reference: Reference) {
        let delta = (self.b1.len() / self.b2.len().max(1)).max(1);
        self.p = self.p.saturating_sub(delta);
        self.replace(true);
        self.b2.remove(&reference.addr);
        self.admit_t2(reference);
    }

    fn on_cold_miss(&mut self, reference: Reference) {
        let c = self.capacity;
        let l1 = self.t1.len() + self.b1.len();
        if l1 >= c {
            if self.t1.len() < c {
                self.b1.pop_oldest();
                self.replace(false);
            } else {
                // B1 is empty and T1 fills the cache: its LRU page goes
                // straight to B1.
                self.evict_from(ResidentList::T1);
            }
        } else {
            let total = l1 + self.t2.len() + self.b2.len();
            if total >= c {
                if total == 2 * c {
                    self.b2.pop_oldest();
                }
                self.replace(false);
            }
        }
        let id = self.t1.push_front(reference.addr);
        self.residents.insert(
            reference.addr,
            ResidentEntry {
                list: ResidentList::T1,
                id,
                dirty: reference.op.is_write(),
            },
        );
    }

    /// Verifies the ARC directory invariants.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.t1.len() + self.t2.len() > self.capacity {
            return Err(InvariantError::new("arc: resident set exceeds capacity"));
        }
        if self.p > self.capacity {
            return Err(InvariantError::new("arc: p outside [0, c]"));
        }
        if self.b1.len() > self.capacity || self.b2.len() > self.capacity {
            return Err(InvariantError::new("arc: ghost list exceeds c"));
        }
        if self.residents.len() != self.t1.len() + self.t2.len() {
            return Err(InvariantError::new("arc: resident index out of sync"));
        }
        for (&addr, entry) in &self.residents {
            let stored = match entry.list {
                ResidentList::T1 => self.t1.get(entry.id),
                ResidentList::T2 => self.t2.get(entry.id),
            };
            if stored != Some(&addr) {
                return Err(InvariantError::new("arc: index points at wrong node"));
            }
            if self.b1.contains(&addr) || self.b2.contains(&addr) {
                return Err(InvariantError::new("arc: resident page has a ghost"));
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.t1.debug_validate_invariants();
        self.t2.debug_validate_invariants();
        self.b1.debug_validate_invariants();
        self.b2.debug_validate_invariants();
        self.check_invariants().unwrap();
    }
}

impl ReplacementPolicy for ArcPolicy {
    fn refer(&mut self, reference: Reference) -> Outcome {
        self.metrics.record_call();
        if self.capacity == 0 {
            return Outcome::Miss;
        }

        if let Some(&entry) = self.residents.get(&reference.addr) {
            self.on_resident_hit(reference, entry);
            return Outcome::Hit;
        }

        if self.b1.contains(&reference.addr) {
            self.on_b1_hit(reference);
        } else if self.b2.contains(&reference.addr) {
            self.on_b2_hit(reference);
        } else {
            self.on_cold_miss(reference);
        }
        Outcome::Miss
    }

    fn summary(&self) -> MetricsSnapshot {
        self.metrics
            .snapshot(self.capacity, self.t1.len() + self.t2.len())
    }

    fn resident_len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refer_all(arc: &mut ArcPolicy, addrs: &[u64]) -> Vec<Outcome> {
        addrs
            .iter()
            .map(|&addr| {
                let outcome = arc.refer(Reference::read(addr));
                arc.debug_validate_invariants();
                outcome
            })
            .collect()
    }

    #[test]
    fn promotes_re_referenced_page_to_t2() {
        let mut arc = ArcPolicy::new(2);
        let outcomes = refer_all(&mut arc, &[1, 2, 1, 3]);
        assert_eq!(
            outcomes,
            vec![Outcome::Miss, Outcome::Miss, Outcome::Hit, Outcome::Miss]
        );

        // 1 moved to T2 on its hit; the T1 side held 2 and then 3.
        assert_eq!(arc.t1_len(), 1);
        assert_eq!(arc.t2_len(), 1);
        assert!(arc.contains(1));
        assert!(arc.contains(3));
        assert!(!arc.contains(2));
    }

    #[test]
    fn b1_hit_grows_p_and_readmits_to_t2() {
        let mut arc = ArcPolicy::new(2);
        refer_all(&mut arc, &[1, 2, 3]);
        assert_eq!(arc.b1_len(), 1);
        assert_eq!(arc.p(), 0);

        // 1 is now a B1 ghost; touching it adapts p upward.
        assert_eq!(arc.refer(Reference::read(1)), Outcome::Miss);
        assert_eq!(arc.p(), 1);
        assert!(arc.contains(1));
        assert_eq!(arc.t2_len(), 1);
        arc.debug_validate_invariants();
    }

    #[test]
    fn resident_bound_holds_under_mixed_trace() {
        let mut arc = ArcPolicy::new(4);
        let trace: Vec<u64> = (0..64).map(|i| (i * 7 + i / 3) % 11).collect();
        for &addr in &trace {
            arc.refer(Reference::read(addr));
            assert!(arc.resident_len() <= 4);
            arc.debug_validate_invariants();
        }
    }

    #[test]
    fn dirty_page_eviction_counts_once() {
        let mut arc = ArcPolicy::new(1);
        arc.refer(Reference::write(1));
        arc.refer(Reference::read(2));
        assert_eq!(arc.summary().dirty_evictions, 1);

        arc.refer(Reference::read(3));
        assert_eq!(arc.summary().dirty_evictions, 1);
        arc.debug_validate_invariants();
    }

    #[test]
    fn zero_capacity_admits_nothing() {
        let mut arc = ArcPolicy::new(0);
        assert_eq!(arc.refer(Reference::write(5)), Outcome::Miss);
        assert_eq!(arc.refer(Reference::write(5)), Outcome::Miss);
        assert_eq!(arc.resident_len(), 0);
        assert_eq!(arc.summary().hits, 0);
    }
}
