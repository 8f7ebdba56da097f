//! Conformance result storage.
//!
//! Results of type-level checks are memoized per (type, protocol, mode).

mod cache;

pub use cache::{CacheKey, CacheStats, ConformanceCache};
