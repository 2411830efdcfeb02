//! Low Inter-reference Recency Set replacement.
//!
//! Pages are classified LIR ("hot", low inter-reference recency) or HIR
//! ("cold"). Two structures cooperate:
//!
//! ```text
//!   stack S (recency, MRU at front)      queue Q (resident HIR only)
//!   ┌──────────────────────────────┐     ┌───────────────────────┐
//!   │ every page with history:     │     │ front ─► ... ◄─ back  │
//!   │ LIR, resident HIR, and       │     │  (evict from back)    │
//!   │ non-resident HIR ghosts      │     └───────────────────────┘
//!   └──────────────────────────────┘
//!        bottom never non-LIR + non-resident (pruned)
//! ```
//!
//! The LIR set is sized to `lir_target = capacity - hir_capacity`, with
//! `hir_capacity` about 1% of capacity (at least 1, at most
//! `capacity - 1`). A hit on a resident HIR page promotes it to LIR and
//! demotes the coldest resident LIR (lowest in S) to HIR. Only resident
//! HIR pages are ever physically evicted, from the back of Q; LIR pages
//! leave the resident set solely by demotion followed by eviction.
//!
//! Pruning drops non-LIR non-resident pages off the bottom of S after
//! every operation and discards their metadata, which bounds history
//! growth and keeps the demotion victim reachable at the bottom.

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;
use crate::metrics::{MetricsSnapshot, PolicyMetrics};
use crate::reference::Reference;
use crate::traits::{Outcome, ReplacementPolicy};

#[derive(Debug, Default)]
struct PageState {
    is_lir: bool,
    resident: bool,
    dirty: bool,
    s_id: Option<SlotId>,
    q_id: Option<SlotId>,
}

/// LIRS policy over page identities.
#[derive(Debug)]
pub struct LirsPolicy {
    stack: IntrusiveList<u64>,
    queue: IntrusiveList<u64>,
    pages: FxHashMap<u64, PageState>,
    resident_count: usize,
    lir_count: usize,
    lir_target: usize,
    hir_capacity: usize,
    capacity: usize,
    metrics: PolicyMetrics,
}

impl LirsPolicy {
    /// Creates a LIRS policy with the given capacity.
    ///
    /// The HIR allotment is 1% of capacity, clamped to
    /// `[1, capacity - 1]`; capacities of 0 or 1 degenerate to an
    /// all-HIR configuration.
    pub fn new(capacity: usize) -> Self {
        let (hir_capacity, lir_target) = if capacity <= 1 {
            (1, 0)
        } else {
            let one_percent = capacity / 100;
            let hir = one_percent.max(1).min(capacity - 1);
            (hir, capacity - hir)
        };
        Self {
            stack: IntrusiveList::with_capacity(capacity),
            queue: IntrusiveList::with_capacity(hir_capacity),
            pages: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            resident_count: 0,
            lir_count: 0,
            lir_target,
            hir_capacity,
            capacity,
            metrics: PolicyMetrics::new(),
        }
    }

    /// Returns `true` if `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.pages
            .get(&addr)
            .is_some_and(|page| page.resident)
    }

    /// Number of pages currently classified LIR.
    pub fn lir_len(&self) -> usize {
        self.lir_count
    }

    /// Number of resident HIR pages in Q.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Target size of the LIR set.
    pub fn lir_target(&self) -> usize {
        self.lir_target
    }

    /// Frames reserved for resident HIR pages.
    pub fn hir_capacity(&self) -> usize {
        self.hir_capacity
    }

    fn move_to_stack_top(&mut self, addr: u64) {
        if let Some(page) = self.pages.get_mut(&addr)
            && let Some(id) = page.s_id.take()
        {
            self.stack.remove(id);
        }
        let id = self.stack.push_front(addr);
        if let Some(page) = self.pages.get_mut(&addr) {
            page.s_id = Some(id);
        }
    }

    fn remove_from_queue(&mut self, addr: u64) {
        if let Some(page) = self.pages.get_mut(&addr)
            && let Some(id) = page.q_id.take()
        {
            self.queue.remove(id);
        }
    }

    fn push_queue_front(&mut self, addr: u64) {
        self.remove_from_queue(addr);
        let id = self.queue.push_front(addr);
        if let Some(page) = self.pages.get_mut(&addr) {
            page.q_id = Some(id);
        }
    }

    /// Drops non-LIR non-resident pages off the bottom of S.
    fn prune_stack(&mut self) {
        while let Some(&bottom) = self.stack.back() {
            let prune = self
                .pages
                .get(&bottom)
                .is_none_or(|page| !page.is_lir && !page.resident);
            if !prune {
                break;
            }
            if let Some(id) = self.stack.back_id() {
                self.stack.remove(id);
            }
            // History is gone once the stack forgets the page.
            self.pages.remove(&bottom);
        }
    }

    /// Demotes the coldest resident LIR page (lowest in S) to HIR.
    fn demote_bottom_lir(&mut self) {
        let victim = self
            .stack
            .iter_rev()
            .copied()
            .find(|addr| {
                self.pages
                    .get(addr)
                    .is_some_and(|page| page.resident && page.is_lir)
            });
        let Some(victim) = victim else { return };
        if let Some(page) = self.pages.get_mut(&victim) {
            page.is_lir = false;
        }
        self.lir_count = self.lir_count.saturating_sub(1);
        self.push_queue_front(victim);
    }

    /// Evicts from the back of Q until the resident bound holds.
    fn evict_from_queue(&mut self) {
        while self.resident_count > self.capacity {
            let Some(victim) = self.queue.pop_back() else {
                break;
            };
            let Some(page) = self.pages.get_mut(&victim) else {
                continue;
            };
            page.q_id = None;
            if page.dirty {
                self.metrics.record_dirty_eviction();
            }
            page.resident = false;
            page.dirty = false;
            page.is_lir = false;
            let keep_history = page.s_id.is_some();
            if !keep_history {
                self.pages.remove(&victim);
            }
            self.resident_count -= 1;
        }
    }

    fn insert_as_resident_hir(&mut self, addr: u64, is_write: bool) {
        let page = self.pages.entry(addr).or_default();
        page.is_lir = false;
        if !page.resident {
            page.resident = true;
            self.resident_count += 1;
        }
        if is_write {
            page.dirty = true;
        }
        self.push_queue_front(addr);
        self.move_to_stack_top(addr);
    }

    fn insert_as_resident_lir(&mut self, addr: u64, is_write: bool) {
        let page = self.pages.entry(addr).or_default();
        if !page.resident {
            page.resident = true;
            self.resident_count += 1;
        }
        if !page.is_lir {
            page.is_lir = true;
            self.lir_count += 1;
        }
        if is_write {
            page.dirty = true;
        }
        // LIR pages never sit in Q.
        self.remove_from_queue(addr);
        self.move_to_stack_top(addr);
    }

    fn on_hit(&mut self, reference: Reference) {
        self.metrics.record_hit(reference.op);
        let is_write = reference.op.is_write();
        let is_lir = match self.pages.get_mut(&reference.addr) {
            Some(page) => {
                if is_write {
                    page.dirty = true;
                }
                page.is_lir
            },
            None => return,
        };

        if is_lir {
            self.move_to_stack_top(reference.addr);
            self.prune_stack();
            return;
        }

        // Resident HIR hit: promote, then rebalance the LIR set.
        self.remove_from_queue(reference.addr);
        self.insert_as_resident_lir(reference.addr, is_write);
        self.demote_bottom_lir();
        self.prune_stack();
    }

    fn on_miss(&mut self, reference: Reference) {
        let is_write = reference.op.is_write();
        let has_history = self
            .pages
            .get(&reference.addr)
            .is_some_and(|page| page.s_id.is_some());

        if self.resident_count < self.capacity {
            // Warmup: fill the LIR set before admitting any HIR page.
            if self.lir_count < self.lir_target {
                self.insert_as_resident_lir(reference.addr, is_write);
            } else {
                self.insert_as_resident_hir(reference.addr, is_write);
            }
            self.prune_stack();
            return;
        }

        if has_history {
            // Non-resident page whose stack trace survived: hot enough
            // to enter as LIR, at the cost of one demotion.
            self.insert_as_resident_lir(reference.addr, is_write);
            self.demote_bottom_lir();
        } else {
            self.insert_as_resident_hir(reference.addr, is_write);
        }

        self.evict_from_queue();
        self.prune_stack();
    }

    /// Verifies stack, queue, and classification bookkeeping.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.resident_count > self.capacity {
            return Err(InvariantError::new("lirs: resident set exceeds capacity"));
        }
        let resident = self.pages.values().filter(|p| p.resident).count();
        if resident != self.resident_count {
            return Err(InvariantError::new("lirs: resident count out of sync"));
        }
        let lir = self.pages.values().filter(|p| p.is_lir).count();
        if lir != self.lir_count {
            return Err(InvariantError::new("lirs: LIR count out of sync"));
        }
        for addr in self.queue.iter() {
            match self.pages.get(addr) {
                Some(page) if page.resident && !page.is_lir => {},
                _ => {
                    return Err(InvariantError::new(
                        "lirs: queue holds a non-resident or LIR page",
                    ));
                },
            }
        }
        if let Some(bottom) = self.stack.back() {
            let ok = self
                .pages
                .get(bottom)
                .is_some_and(|page| page.is_lir || page.resident);
            if !ok {
                return Err(InvariantError::new(
                    "lirs: stack bottom is non-LIR and non-resident",
                ));
            }
        }
        for (addr, page) in &self.pages {
            if let Some(id) = page.s_id
                && self.stack.get(id) != Some(addr)
            {
                return Err(InvariantError::new("lirs: stale stack handle"));
            }
            if let Some(id) = page.q_id
                && self.queue.get(id) != Some(addr)
            {
                return Err(InvariantError::new("lirs: stale queue handle"));
            }
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.stack.debug_validate_invariants();
        self.queue.debug_validate_invariants();
        self.check_invariants().unwrap();
    }
}

impl ReplacementPolicy for LirsPolicy {
    fn refer(&mut self, reference: Reference) -> Outcome {
        self.metrics.record_call();
        if self.capacity == 0 {
            return Outcome::Miss;
        }

        if self.contains(reference.addr) {
            self.on_hit(reference);
            Outcome::Hit
        } else {
            self.on_miss(reference);
            Outcome::Miss
        }
    }

    fn summary(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.resident_count)
    }

    fn resident_len(&self) -> usize {
        self.resident_count
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refer_all(lirs: &mut LirsPolicy, addrs: &[u64]) -> Vec<Outcome> {
        addrs
            .iter()
            .map(|&addr| {
                let outcome = lirs.refer(Reference::read(addr));
                lirs.debug_validate_invariants();
                outcome
            })
            .collect()
    }

    #[test]
    fn sizing_reserves_at_least_one_hir_frame() {
        let lirs = LirsPolicy::new(4);
        assert_eq!(lirs.hir_capacity(), 1);
        assert_eq!(lirs.lir_target(), 3);

        let big = LirsPolicy::new(400);
        assert_eq!(big.hir_capacity(), 4);
        assert_eq!(big.lir_target(), 396);

        let tiny = LirsPolicy::new(1);
        assert_eq!(tiny.lir_target(), 0);
    }

    #[test]
    fn warmup_fills_lir_set_then_admits_hir() {
        let mut lirs = LirsPolicy::new(4);
        refer_all(&mut lirs, &[1, 2, 3]);
        assert_eq!(lirs.lir_len(), 3);
        assert_eq!(lirs.queue_len(), 0);

        // LIR target reached: the next new page lands in Q as HIR.
        lirs.refer(Reference::read(4));
        assert_eq!(lirs.lir_len(), 3);
        assert_eq!(lirs.queue_len(), 1);
        lirs.debug_validate_invariants();
    }

    #[test]
    fn full_cache_evicts_resident_hir_only() {
        let mut lirs = LirsPolicy::new(4);
        refer_all(&mut lirs, &[1, 2, 3, 4, 5]);

        // 4 was the only resident HIR page, so it made room for 5.
        assert!(!lirs.contains(4));
        assert!(lirs.contains(5));
        assert_eq!(lirs.resident_len(), 4);
        assert_eq!(lirs.lir_len(), 3);
    }

    #[test]
    fn hir_hit_promotes_and_demotes_a_lir_page() {
        let mut lirs = LirsPolicy::new(4);
        refer_all(&mut lirs, &[1, 2, 3, 4]);

        // 4 is resident HIR; hitting it promotes it to LIR and demotes
        // the coldest LIR page (1) into Q.
        assert_eq!(lirs.refer(Reference::read(4)), Outcome::Hit);
        assert_eq!(lirs.lir_len(), 3);
        assert_eq!(lirs.queue_len(), 1);
        assert!(lirs.contains(1));
        lirs.debug_validate_invariants();
    }

    #[test]
    fn history_miss_reenters_as_lir() {
        let mut lirs = LirsPolicy::new(4);
        refer_all(&mut lirs, &[1, 2, 3, 4, 5]);
        assert!(!lirs.contains(4));

        // 4 still has a stack trace, so its miss readmits it as LIR.
        assert_eq!(lirs.refer(Reference::read(4)), Outcome::Miss);
        assert!(lirs.contains(4));
        assert_eq!(lirs.lir_len(), 3);
        assert_eq!(lirs.resident_len(), 4);
        lirs.debug_validate_invariants();
    }

    #[test]
    fn dirty_hir_eviction_counts_once() {
        let mut lirs = LirsPolicy::new(4);
        refer_all(&mut lirs, &[1, 2, 3]);
        lirs.refer(Reference::write(4));
        lirs.refer(Reference::read(5));

        // Dirty HIR page 4 was evicted from Q.
        assert_eq!(lirs.summary().dirty_evictions, 1);
        lirs.refer(Reference::read(6));
        assert_eq!(lirs.summary().dirty_evictions, 1);
        lirs.debug_validate_invariants();
    }

    #[test]
    fn zero_capacity_admits_nothing() {
        let mut lirs = LirsPolicy::new(0);
        assert_eq!(lirs.refer(Reference::write(1)), Outcome::Miss);
        assert_eq!(lirs.refer(Reference::write(1)), Outcome::Miss);
        assert_eq!(lirs.resident_len(), 0);
        assert_eq!(lirs.summary().dirty_evictions, 0);
    }

    #[test]
    fn resident_bound_holds_under_looping_trace() {
        let mut lirs = LirsPolicy::new(3);
        for round in 0..8u64 {
            for addr in 0..6u64 {
                lirs.refer(Reference::new(
                    addr,
                    if round % 2 == 0 {
                        crate::reference::OpKind::Read
                    } else {
                        crate::reference::OpKind::Write
                    },
                ));
                assert!(lirs.resident_len() <= 3);
                lirs.debug_validate_invariants();
            }
        }
    }
}
