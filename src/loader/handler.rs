//! Data Loader Contract
//!
//! Callback and outcome types shared by every loader in the data pipeline.

use crate::error::{CacheError, Result};
use crate::recipe::Recipe;

// == Load Handler ==
/// Receives the result of a [`DataLoader::load_data`] call.
pub trait LoadHandler<V> {
    /// Called when the lookup completed. `None` means the loader had nothing
    /// for this recipe; it is not a failure.
    fn on_success(&mut self, recipe: &Recipe, params: &[String], value: Option<V>);

    /// Called when the loader itself could not complete the lookup.
    fn on_failure(&mut self, recipe: &Recipe, params: &[String], error: CacheError);
}

// == Data Loader ==
/// A source that can answer recipe lookups.
pub trait DataLoader<V> {
    /// Looks up `recipe` + `params` and reports through `handler`.
    ///
    /// Returns `true` if the lookup path completed without internal error.
    fn load_data(&self, recipe: &Recipe, params: &[String], handler: &mut dyn LoadHandler<V>)
        -> bool;
}

// == Load Outcome ==
/// Result of a single cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<V> {
    Found(V),
    NotFound,
    Error(CacheError),
}

impl<V> LoadOutcome<V> {
    pub fn is_found(&self) -> bool {
        matches!(self, LoadOutcome::Found(_))
    }

    /// Collapses the outcome: misses become `Ok(None)`, failures `Err`.
    pub fn into_result(self) -> Result<Option<V>> {
        match self {
            LoadOutcome::Found(value) => Ok(Some(value)),
            LoadOutcome::NotFound => Ok(None),
            LoadOutcome::Error(err) => Err(err),
        }
    }
}

impl<V> From<Option<V>> for LoadOutcome<V> {
    fn from(value: Option<V>) -> Self {
        value.map_or(LoadOutcome::NotFound, LoadOutcome::Found)
    }
}
