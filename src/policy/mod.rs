//! Concrete replacement policies.
//!
//! Each policy implements [`crate::traits::ReplacementPolicy`] on its
//! own state; there are no dependencies between policies.

pub mod arc;
pub mod cacheus;
pub mod lfu;
pub mod lirs;
pub mod lru;

pub use arc::ArcPolicy;
pub use cacheus::CacheusPolicy;
pub use lfu::LfuPolicy;
pub use lirs::LirsPolicy;
pub use lru::LruPolicy;
