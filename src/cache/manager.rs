//! Cache Manager Trait
//!
//! The seam between cache consumers and a concrete cache implementation.

use std::collections::HashSet;

use crate::cache::CacheStats;
use crate::error::Result;

/// Key-value cache contract used by the recipe layer.
///
/// Implementations decide how `size` is measured, but must measure it the
/// same way when inserting and when evicting.
pub trait CacheManager<V>: Send + Sync {
    /// Stores a value with no expiration, overwriting any previous value.
    fn put(&self, key: String, value: V) -> Result<()>;

    /// Stores a value that expires after `expiration_secs`.
    ///
    /// Implementations without expiration support return
    /// [`CacheError::Unsupported`](crate::error::CacheError::Unsupported).
    fn put_with_expiration(&self, key: String, value: V, expiration_secs: u64) -> Result<()>;

    /// Returns the value for `key`, if present.
    fn get(&self, key: &str) -> Option<V>;

    /// Fallible form of [`get`](Self::get) used by the recipe layer.
    ///
    /// Backends whose reads can fail override this so the failure reaches
    /// the load handler instead of looking like a miss.
    fn try_get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.get(key))
    }

    /// Current size of the cache.
    fn size(&self) -> usize;

    /// Updates the capacity of the cache.
    fn resize(&self, new_max: usize) -> Result<()>;

    /// Configured capacity of the cache.
    fn max_size(&self) -> usize;

    fn contains_key(&self, key: &str) -> bool;

    /// Returns every key whose value equals `value`.
    fn contains_value(&self, value: &V) -> HashSet<String>;

    /// Removes `key`, returning the value it held.
    fn remove_key(&self, key: &str) -> Option<V>;

    fn clear(&self);

    fn stats(&self) -> CacheStats;
}
