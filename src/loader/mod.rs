//! Loader Module
//!
//! Recipe-addressed access to a bounded cache.
//!
//! # Components
//! - `derive_key`: deterministic key from a recipe and its parameters
//! - `RecipeCache`: load/store facade, synchronous and asynchronous
//! - `DataLoader` / `LoadHandler`: callback contract used by the data pipeline

mod adapter;
mod handler;
mod key;

pub use adapter::RecipeCache;
pub use handler::{DataLoader, LoadHandler, LoadOutcome};
pub use key::{derive_key, SEGMENT_LEN};
