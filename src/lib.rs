//! cachesim: trace-driven evaluation of cache replacement policies.
//!
//! Feed `(address, operation)` references to a policy engine and read
//! back hit/miss and dirty-eviction statistics. See `DESIGN.md` for
//! internal architecture and invariants.

pub mod builder;
pub mod ds;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod reference;
pub mod traits;
