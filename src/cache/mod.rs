//! Cache Module
//!
//! Provides a thread-safe, size-bounded in-memory cache with LRU eviction.

mod entry;
mod lru;
mod manager;
mod stats;
mod store;


// Re-export public types
pub use entry::{unit_weigher, CacheEntry, Weigher};
pub use lru::LruTracker;
pub use manager::CacheManager;
pub use stats::CacheStats;
pub use store::{BoundedCache, DEFAULT_MAX_SIZE};
