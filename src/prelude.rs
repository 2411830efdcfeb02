pub use crate::builder::{PolicyBuilder, PolicyEngine, PolicyKind, SharedPolicy};
pub use crate::ds::{FrequencyBuckets, GhostList, IntrusiveList, SlotArena, SlotId};
pub use crate::error::InvariantError;
pub use crate::metrics::MetricsSnapshot;
pub use crate::policy::{ArcPolicy, CacheusPolicy, LfuPolicy, LirsPolicy, LruPolicy};
pub use crate::reference::{OpKind, Reference};
pub use crate::traits::{Outcome, ReplacementPolicy};
