//! Recipe Cache Facade
//!
//! Adapts a [`CacheManager`] to the recipe-oriented load/store contract.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};

use crate::cache::{BoundedCache, CacheManager, CacheStats};
use crate::error::Result;
use crate::loader::{derive_key, DataLoader, LoadHandler, LoadOutcome};
use crate::recipe::Recipe;

/// A store deferred to the background writer.
struct StoreJob<V> {
    recipe: Recipe,
    params: Vec<String>,
    value: V,
}

// == Recipe Cache ==
/// Content-addressed cache facade.
///
/// Cloning is cheap and every clone shares the same cache and the same
/// background writer.
pub struct RecipeCache<V> {
    cache: Arc<dyn CacheManager<V>>,
    /// Started on the first asynchronous store, restarted if it has died.
    writer: Arc<Mutex<Option<UnboundedSender<StoreJob<V>>>>>,
}

impl<V> Clone for RecipeCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<V> RecipeCache<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a facade over a new [`BoundedCache`].
    ///
    /// A `size` of zero selects the default capacity.
    pub fn new(size: usize) -> Self {
        Self::with_cache(Arc::new(BoundedCache::new(size)))
    }

    /// Creates a facade over a cache owned elsewhere.
    pub fn with_cache(cache: Arc<dyn CacheManager<V>>) -> Self {
        Self {
            cache,
            writer: Arc::new(Mutex::new(None)),
        }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &Arc<dyn CacheManager<V>> {
        &self.cache
    }

    // == Lookup ==
    /// Looks up the value stored for `recipe` + `params`.
    pub fn lookup<S: AsRef<str>>(&self, recipe: &Recipe, params: &[S]) -> LoadOutcome<V> {
        match derive_key(recipe, params).and_then(|key| self.cache.try_get(&key)) {
            Ok(value) => value.into(),
            Err(err) => LoadOutcome::Error(err),
        }
    }

    // == Store ==
    /// Stores `value` for `recipe` + `params` on the calling thread.
    pub fn store_data<S: AsRef<str>>(&self, recipe: &Recipe, params: &[S], value: V) -> Result<()> {
        store(self.cache.as_ref(), recipe, params, value)
    }

    // == Store Async ==
    /// Hands the store to the background writer and returns immediately.
    ///
    /// Failures are logged and never reported back. Stores issued from one
    /// caller are applied in the order they were issued. The writer is a
    /// dedicated thread, so it outlives whichever runtime the caller is on.
    pub fn store_data_async(&self, recipe: Recipe, params: Vec<String>, value: V) {
        let job = StoreJob { recipe, params, value };
        let mut writer = self.writer.lock();

        let job = match writer.as_ref() {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                Err(SendError(job)) => {
                    warn!("cache writer has stopped, restarting it");
                    job
                }
            },
            None => job,
        };

        match spawn_writer(Arc::clone(&self.cache)) {
            Ok(tx) => {
                if tx.send(job).is_err() {
                    warn!("cache writer exited immediately, dropping asynchronous store");
                }
                *writer = Some(tx);
            }
            Err(err) => {
                error!(error = %err, "failed to start cache writer thread, dropping asynchronous store");
                *writer = None;
            }
        }
    }

    // == Pass-throughs ==
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn set_cache_size(&self, size: usize) -> Result<()> {
        self.cache.resize(size)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.size()
    }

    pub fn max_cache_size(&self) -> usize {
        self.cache.max_size()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<V> DataLoader<V> for RecipeCache<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Reports a miss as success with `None`; key derivation and backend
    /// read failures reach `on_failure`.
    fn load_data(
        &self,
        recipe: &Recipe,
        params: &[String],
        handler: &mut dyn LoadHandler<V>,
    ) -> bool {
        match self.lookup(recipe, params) {
            LoadOutcome::Found(value) => {
                handler.on_success(recipe, params, Some(value));
                true
            }
            LoadOutcome::NotFound => {
                handler.on_success(recipe, params, None);
                true
            }
            LoadOutcome::Error(err) => {
                error!(error = %err, "cache lookup failed");
                handler.on_failure(recipe, params, err);
                false
            }
        }
    }
}

impl<V> fmt::Debug for RecipeCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeCache")
            .field("size", &self.cache.size())
            .field("max_size", &self.cache.max_size())
            .finish()
    }
}

// == Helpers ==
fn store<V, S: AsRef<str>>(
    cache: &dyn CacheManager<V>,
    recipe: &Recipe,
    params: &[S],
    value: V,
) -> Result<()> {
    let key = derive_key(recipe, params)?;
    cache.put(key, value)
}

/// Starts the single consumer that applies asynchronous stores in FIFO order.
///
/// The consumer owns an OS thread and exits once every sender is dropped.
fn spawn_writer<V>(cache: Arc<dyn CacheManager<V>>) -> io::Result<UnboundedSender<StoreJob<V>>>
where
    V: Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<StoreJob<V>>();

    thread::Builder::new()
        .name("recipe-cache-writer".to_string())
        .spawn(move || drain_blocking(cache, rx))?;

    debug!("cache writer thread started");
    Ok(tx)
}

fn drain_blocking<V>(cache: Arc<dyn CacheManager<V>>, mut rx: UnboundedReceiver<StoreJob<V>>) {
    while let Some(job) = rx.blocking_recv() {
        apply(cache.as_ref(), job);
    }
    debug!("cache writer thread finished");
}

fn apply<V>(cache: &dyn CacheManager<V>, job: StoreJob<V>) {
    let StoreJob { recipe, params, value } = job;
    if let Err(err) = store(cache, &recipe, &params, value) {
        error!(error = %err, "failed to put data in cache for recipe");
    }
}
