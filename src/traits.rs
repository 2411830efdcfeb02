//! The replacement-policy trait and the outcome of one reference.

use crate::metrics::MetricsSnapshot;
use crate::reference::Reference;

/// Result of feeding one reference to a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The page was resident.
    Hit,
    /// The page was not resident and has been admitted (capacity permitting).
    Miss,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Hit`].
    pub fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }
}

/// A trace-driven cache replacement policy.
///
/// A policy owns a bounded resident set of page identities plus whatever
/// bookkeeping its algorithm needs. Feeding it a [`Reference`] updates
/// that state and the instance counters; no page data is stored.
pub trait ReplacementPolicy {
    /// Processes one reference and reports hit or miss.
    fn refer(&mut self, reference: Reference) -> Outcome;

    /// Returns a snapshot of the instance counters.
    fn summary(&self) -> MetricsSnapshot;

    /// Number of currently resident pages.
    fn resident_len(&self) -> usize;

    /// Configured capacity.
    fn capacity(&self) -> usize;

    /// Returns `true` if nothing is resident.
    fn is_empty(&self) -> bool {
        self.resident_len() == 0
    }
}
