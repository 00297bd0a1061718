//! Cache Module
//!
//! Provides a generic in-memory cache with TTL expiration, size-triggered
//! approximate-LRU pruning and atomic per-key transactions.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::BoundedTtlCache;

// == Public Constants ==
/// Number of independently locked shards per cache
pub const SHARD_COUNT: usize = 32;
