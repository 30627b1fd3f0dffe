//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and how they are weighed.

use std::fmt;
use std::sync::Arc;

// == Weigher ==
/// Computes the size an entry contributes to the cache total.
///
/// Must return the same value for the same key/value pair every time it is
/// asked, since the weight recorded at insert is the weight released on evict.
pub type Weigher<V> = Arc<dyn Fn(&str, &V) -> usize + Send + Sync>;

/// Default weigher: every entry counts as one unit.
pub fn unit_weigher<V>() -> Weigher<V> {
    Arc::new(|_: &str, _: &V| 1)
}

// == Cache Entry ==
/// Represents a single cache entry with its recorded weight.
#[derive(Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Weight recorded when the entry was inserted
    pub weight: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with a precomputed weight.
    pub fn new(value: V, weight: usize) -> Self {
        Self { value, weight }
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("value", &self.value)
            .field("weight", &self.weight)
            .finish()
    }
}
