//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and
//! weight-based capacity accounting.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{unit_weigher, CacheEntry, CacheManager, CacheStats, LruTracker, Weigher};
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Capacity used when a cache is requested with a size of zero (4 MiB units)
pub const DEFAULT_MAX_SIZE: usize = 4 * 1024 * 1024;

// == Inner State ==
/// Everything guarded by the cache lock.
struct Inner<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Sum of the weights of all entries
    size: usize,
    /// Maximum total weight allowed
    max_size: usize,
}

impl<V> Inner<V> {
    /// Evicts least recently used entries until `size <= max`.
    fn trim_to(&mut self, max: usize) {
        while self.size > max {
            let Some(key) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                self.size -= entry.weight;
                self.stats.record_eviction();
                debug!(key = %key, weight = entry.weight, "evicted least recently used entry");
            }
        }
        self.stats.set_total_entries(self.entries.len());
    }
}

// == Bounded Cache ==
/// Thread-safe, size-bounded LRU cache keyed by strings.
///
/// Every public operation takes the internal lock exactly once, so each call
/// is atomic with respect to every other call, including [`clear`](Self::clear).
/// No multi-call transactions are offered.
pub struct BoundedCache<V> {
    inner: Mutex<Inner<V>>,
    weigher: Weigher<V>,
}

impl<V> BoundedCache<V> {
    // == Constructor ==
    /// Creates a cache that counts one unit per entry.
    ///
    /// A `max_size` of zero selects [`DEFAULT_MAX_SIZE`].
    pub fn new(max_size: usize) -> Self {
        Self::with_weigher(max_size, unit_weigher())
    }

    /// Creates a cache whose entries are weighed by `weigher`.
    ///
    /// A `max_size` of zero selects [`DEFAULT_MAX_SIZE`].
    pub fn with_weigher(max_size: usize, weigher: Weigher<V>) -> Self {
        let max_size = if max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            max_size
        };

        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
                size: 0,
                max_size,
            }),
            weigher,
        }
    }

    // == Put ==
    /// Inserts or overwrites a value.
    ///
    /// The entry becomes the most recently used one. If the new total weight
    /// exceeds the capacity, least recently used entries are evicted until it
    /// fits. An entry heavier than the whole capacity is evicted straight away.
    pub fn put(&self, key: String, value: V) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidArgument(
                "key cannot be empty".to_string(),
            ));
        }

        let weight = (self.weigher)(key.as_str(), &value);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let Some(previous) = inner.entries.insert(key.clone(), CacheEntry::new(value, weight)) {
            inner.size -= previous.weight;
        }
        inner.size += weight;
        inner.lru.touch(&key);
        inner.stats.record_put();

        inner.trim_to(inner.max_size);
        Ok(())
    }

    // == Put With Expiration ==
    /// Expiring entries are not supported; always fails with
    /// [`CacheError::Unsupported`] and leaves the cache untouched.
    pub fn put_with_expiration(&self, _key: String, _value: V, _expiration_secs: u64) -> Result<()> {
        Err(CacheError::Unsupported(
            "put with expiration is not supported in this version".to_string(),
        ))
    }

    // == Size ==
    /// Current total weight of all entries.
    pub fn size(&self) -> usize {
        self.inner.lock().size
    }

    /// Number of entries, independent of their weight.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    // == Max Size ==
    pub fn max_size(&self) -> usize {
        self.inner.lock().max_size
    }

    // == Resize ==
    /// Changes the capacity, evicting immediately if the cache is now too large.
    pub fn resize(&self, new_max: usize) -> Result<()> {
        if new_max == 0 {
            return Err(CacheError::InvalidArgument(
                "max size must be greater than 0".to_string(),
            ));
        }

        let mut inner = self.inner.lock();
        inner.max_size = new_max;
        inner.trim_to(new_max);
        debug!(max_size = new_max, size = inner.size, "cache resized");
        Ok(())
    }

    // == Contains Key ==
    /// Checks presence without touching recency or statistics.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    // == Remove Key ==
    /// Removes an entry, returning its value if it was present.
    pub fn remove_key(&self, key: &str) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let entry = inner.entries.remove(key)?;
        inner.lru.remove(key);
        inner.size -= entry.weight;
        inner.stats.set_total_entries(inner.entries.len());
        Some(entry.value)
    }

    // == Clear ==
    /// Removes every entry under a single lock acquisition.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.lru.clear();
        inner.size = 0;
        inner.stats.set_total_entries(0);
        debug!(removed, "cache cleared");
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}

impl<V: Clone> BoundedCache<V> {
    // == Get ==
    /// Returns a clone of the value and marks the entry most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.entries.get(key) {
            Some(entry) => {
                let value = entry.value.clone();
                inner.lru.touch(key);
                inner.stats.record_hit();
                Some(value)
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }
}

impl<V: PartialEq> BoundedCache<V> {
    // == Contains Value ==
    /// Returns every key currently mapped to `value`.
    ///
    /// Scans the whole cache; keep it off hot paths.
    pub fn contains_value(&self, value: &V) -> HashSet<String> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.value == *value)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl<V> Default for BoundedCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl<V> fmt::Debug for BoundedCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("BoundedCache")
            .field("entries", &inner.entries.len())
            .field("size", &inner.size)
            .field("max_size", &inner.max_size)
            .finish()
    }
}

impl<V> CacheManager<V> for BoundedCache<V>
where
    V: Clone + PartialEq + Send + Sync,
{
    fn put(&self, key: String, value: V) -> Result<()> {
        BoundedCache::put(self, key, value)
    }

    fn put_with_expiration(&self, key: String, value: V, expiration_secs: u64) -> Result<()> {
        BoundedCache::put_with_expiration(self, key, value, expiration_secs)
    }

    fn get(&self, key: &str) -> Option<V> {
        BoundedCache::get(self, key)
    }

    fn size(&self) -> usize {
        BoundedCache::size(self)
    }

    fn resize(&self, new_max: usize) -> Result<()> {
        BoundedCache::resize(self, new_max)
    }

    fn max_size(&self) -> usize {
        BoundedCache::max_size(self)
    }

    fn contains_key(&self, key: &str) -> bool {
        BoundedCache::contains_key(self, key)
    }

    fn contains_value(&self, value: &V) -> HashSet<String> {
        BoundedCache::contains_value(self, value)
    }

    fn remove_key(&self, key: &str) -> Option<V> {
        BoundedCache::remove_key(self, key)
    }

    fn clear(&self) {
        BoundedCache::clear(self)
    }

    fn stats(&self) -> CacheStats {
        BoundedCache::stats(self)
    }
}
