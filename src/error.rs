//! Error types for the cache core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, key derivation and scheduling layers.
///
/// Cache misses are never errors; they surface as `None` or
/// [`LoadOutcome::NotFound`](crate::loader::LoadOutcome::NotFound).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Malformed input at construction or call time
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation that this cache version never supports
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Recipe or parameter hashing failed
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Recipe text could not be turned into a recipe map
    #[error("Recipe is invalid: {0}")]
    RecipeParse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::RecipeParse(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache core.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Unsupported("expiring put".to_string());
        assert_eq!(err.to_string(), "Unsupported operation: expiring put");

        let err = CacheError::InvalidArgument("interval cannot be 0".to_string());
        assert_eq!(err.to_string(), "Invalid argument: interval cannot be 0");
    }

    #[test]
    fn test_serde_error_maps_to_recipe_parse() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CacheError = parse_err.into();
        assert!(matches!(err, CacheError::RecipeParse(_)));
    }
}
