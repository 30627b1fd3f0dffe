//! Recipe Cache - bounded in-memory caching for a data-loading pipeline
//!
//! Provides a size-bounded LRU cache, a recipe-addressed load/store facade
//! over it, and a fixed-delay recurring task runner.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod recipe;
pub mod tasks;

pub use cache::{BoundedCache, CacheManager};
pub use config::Config;
pub use error::{CacheError, Result};
pub use loader::{derive_key, DataLoader, LoadHandler, LoadOutcome, RecipeCache};
pub use recipe::Recipe;
pub use tasks::{RecurringTask, ScheduleHandle, TimeUnit};
