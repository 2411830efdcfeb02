//! Unified construction and dispatch for all replacement policies.
//!
//! A policy is selected once, at build time; afterwards every call goes
//! through a closed set of tagged variants with no further runtime type
//! inspection.
//!
//! ## Example
//!
//! ```rust
//! use cachesim::builder::{PolicyBuilder, PolicyKind};
//! use cachesim::reference::Reference;
//! use cachesim::traits::{Outcome, ReplacementPolicy};
//!
//! let mut engine = PolicyBuilder::new(100).build(PolicyKind::Arc);
//! assert_eq!(engine.refer(Reference::read(1)), Outcome::Miss);
//! assert_eq!(engine.refer(Reference::read(1)), Outcome::Hit);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::metrics::MetricsSnapshot;
use crate::policy::arc::ArcPolicy;
use crate::policy::cacheus::CacheusPolicy;
use crate::policy::lfu::LfuPolicy;
use crate::policy::lirs::LirsPolicy;
use crate::policy::lru::LruPolicy;
use crate::reference::Reference;
use crate::traits::{Outcome, ReplacementPolicy};

/// Available replacement policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Least Recently Used baseline.
    Lru,
    /// Least Frequently Used baseline.
    Lfu,
    /// Adaptive Replacement Cache.
    Arc,
    /// Low Inter-reference Recency Set.
    Lirs,
    /// Expert-weighted LRU/LFU hybrid.
    Cacheus,
}

impl PolicyKind {
    /// Stable name for reports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Lru => "LRU",
            PolicyKind::Lfu => "LFU",
            PolicyKind::Arc => "ARC",
            PolicyKind::Lirs => "LIRS",
            PolicyKind::Cacheus => "CACHEUS",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified engine wrapper dispatching to the selected policy.
#[derive(Debug)]
pub struct PolicyEngine {
    inner: EngineInner,
}

#[derive(Debug)]
enum EngineInner {
    Lru(LruPolicy),
    Lfu(LfuPolicy),
    Arc(ArcPolicy),
    Lirs(LirsPolicy),
    Cacheus(CacheusPolicy),
}

impl PolicyEngine {
    /// The kind this engine was built with.
    pub fn kind(&self) -> PolicyKind {
        match &self.inner {
            EngineInner::Lru(_) => PolicyKind::Lru,
            EngineInner::Lfu(_) => PolicyKind::Lfu,
            EngineInner::Arc(_) => PolicyKind::Arc,
            EngineInner::Lirs(_) => PolicyKind::Lirs,
            EngineInner::Cacheus(_) => PolicyKind::Cacheus,
        }
    }

    /// Runs the selected policy's structural invariant checks.
    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantError> {
        match &self.inner {
            EngineInner::Lru(lru) => lru.check_invariants(),
            EngineInner::Lfu(lfu) => lfu.check_invariants(),
            EngineInner::Arc(arc) => arc.check_invariants(),
            EngineInner::Lirs(lirs) => lirs.check_invariants(),
            EngineInner::Cacheus(cacheus) => cacheus.check_invariants(),
        }
    }
}

impl ReplacementPolicy for PolicyEngine {
    fn refer(&mut self, reference: Reference) -> Outcome {
        match &mut self.inner {
            EngineInner::Lru(lru) => lru.refer(reference),
            EngineInner::Lfu(lfu) => lfu.refer(reference),
            EngineInner::Arc(arc) => arc.refer(reference),
            EngineInner::Lirs(lirs) => lirs.refer(reference),
            EngineInner::Cacheus(cacheus) => cacheus.refer(reference),
        }
    }

    fn summary(&self) -> MetricsSnapshot {
        match &self.inner {
            EngineInner::Lru(lru) => lru.summary(),
            EngineInner::Lfu(lfu) => lfu.summary(),
            EngineInner::Arc(arc) => arc.summary(),
            EngineInner::Lirs(lirs) => lirs.summary(),
            EngineInner::Cacheus(cacheus) => cacheus.summary(),
        }
    }

    fn resident_len(&self) -> usize {
        match &self.inner {
            EngineInner::Lru(lru) => lru.resident_len(),
            EngineInner::Lfu(lfu) => lfu.resident_len(),
            EngineInner::Arc(arc) => arc.resident_len(),
            EngineInner::Lirs(lirs) => lirs.resident_len(),
            EngineInner::Cacheus(cacheus) => cacheus.resident_len(),
        }
    }

    fn capacity(&self) -> usize {
        match &self.inner {
            EngineInner::Lru(lru) => lru.capacity(),
            EngineInner::Lfu(lfu) => lfu.capacity(),
            EngineInner::Arc(arc) => arc.capacity(),
            EngineInner::Lirs(lirs) => lirs.capacity(),
            EngineInner::Cacheus(cacheus) => cacheus.capacity(),
        }
    }
}

/// Builder for policy engines.
pub struct PolicyBuilder {
    capacity: usize,
}

impl PolicyBuilder {
    /// Creates a builder for engines of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Builds an engine running the selected policy.
    pub fn build(self, kind: PolicyKind) -> PolicyEngine {
        let inner = match kind {
            PolicyKind::Lru => EngineInner::Lru(LruPolicy::new(self.capacity)),
            PolicyKind::Lfu => EngineInner::Lfu(LfuPolicy::new(self.capacity)),
            PolicyKind::Arc => EngineInner::Arc(ArcPolicy::new(self.capacity)),
            PolicyKind::Lirs => EngineInner::Lirs(LirsPolicy::new(self.capacity)),
            PolicyKind::Cacheus => EngineInner::Cacheus(CacheusPolicy::new(self.capacity)),
        };
        PolicyEngine { inner }
    }

    /// Builds an engine wrapped for shared use across threads.
    pub fn build_shared(self, kind: PolicyKind) -> SharedPolicy {
        SharedPolicy {
            inner: Arc::new(Mutex::new(self.build(kind))),
        }
    }
}

/// Thread-safe handle around a [`PolicyEngine`].
///
/// Every operation takes the lock; `refer` mutates policy state even on
/// a hit, so a plain mutex is the right tool here.
#[derive(Clone)]
pub struct SharedPolicy {
    inner: Arc<Mutex<PolicyEngine>>,
}

impl SharedPolicy {
    /// Processes one reference.
    pub fn refer(&self, reference: Reference) -> Outcome {
        self.inner.lock().refer(reference)
    }

    /// Snapshot of the engine's counters.
    pub fn summary(&self) -> MetricsSnapshot {
        self.inner.lock().summary()
    }

    /// Number of resident pages.
    pub fn resident_len(&self) -> usize {
        self.inner.lock().resident_len()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// The kind the underlying engine was built with.
    pub fn kind(&self) -> PolicyKind {
        self.inner.lock().kind()
    }
}

impl fmt::Debug for SharedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.inner.lock();
        f.debug_struct("SharedPolicy")
            .field("kind", &engine.kind())
            .field("resident", &engine.resident_len())
            .field("capacity", &engine.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [PolicyKind; 5] = [
        PolicyKind::Lru,
        PolicyKind::Lfu,
        PolicyKind::Arc,
        PolicyKind::Lirs,
        PolicyKind::Cacheus,
    ];

    #[test]
    fn all_kinds_build_and_serve_basic_trace() {
        for kind in ALL_KINDS {
            let mut engine = PolicyBuilder::new(4).build(kind);
            assert_eq!(engine.kind(), kind);
            assert_eq!(engine.capacity(), 4);

            assert_eq!(engine.refer(Reference::read(1)), Outcome::Miss);
            assert_eq!(engine.refer(Reference::read(1)), Outcome::Hit);
            let snap = engine.summary();
            assert_eq!(snap.calls, 2, "{kind}");
            assert_eq!(snap.hits, 1, "{kind}");
            assert_eq!(engine.resident_len(), 1, "{kind}");
        }
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(PolicyKind::Arc.to_string(), "ARC");
        assert_eq!(PolicyKind::Cacheus.as_str(), "CACHEUS");
    }

    #[test]
    fn shared_handle_works_across_threads() {
        let shared = PolicyBuilder::new(8).build_shared(PolicyKind::Lru);
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..16 {
                        shared.refer(Reference::read(t * 100 + i % 4));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = shared.summary();
        assert_eq!(snap.calls, 64);
        assert!(shared.resident_len() <= 8);
    }
}
