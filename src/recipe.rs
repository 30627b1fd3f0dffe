//! Recipe Module
//!
//! A recipe is a JSON object describing *what* to fetch. It is never the
//! fetched data itself, and never a cache key by itself; keys are derived
//! from its canonical form (see [`crate::loader::derive_key`]).

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::error::{CacheError, Result};

/// Separator between segments of an item path such as `"query/params/page"`.
pub const PATH_SEPARATOR: char = '/';

const COMMENT_START: &str = "/*";
const COMMENT_END: &str = "*/";

// == Recipe ==
/// Ordered map of string keys to nested JSON values.
///
/// Key order is preserved as written, so two recipes parsed from the same
/// text always serialize to the same canonical string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    map: Map<String, Value>,
}

impl Recipe {
    // == Constructors ==
    /// Wraps an existing map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Parses a recipe from JSON text, ignoring `/* ... */` comments.
    ///
    /// The root must be a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cleaned = strip_comments(text);
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Object(map)) => Ok(Self { map }),
            Ok(other) => {
                error!(kind = value_kind(&other), "recipe root is not an object");
                Err(CacheError::RecipeParse(format!(
                    "recipe root must be an object, found {}",
                    value_kind(&other)
                )))
            }
            Err(err) => {
                error!(error = %err, "recipe parsing failed");
                Err(err.into())
            }
        }
    }

    /// Reads and parses a recipe file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            CacheError::RecipeParse(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_json_str(&text)
    }

    // == Accessors ==
    pub fn map(&self) -> &Map<String, Value> {
        &self.map
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of top-level items.
    pub fn item_count_of_root(&self) -> usize {
        self.map.len()
    }

    /// True if `path` resolves to an item, including an explicit `null`.
    pub fn contains_item(&self, path: &str) -> bool {
        self.item(path).is_some()
    }

    /// Resolves a `/`-separated path through nested objects.
    pub fn item(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let mut current = self.map.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn item_as_bool(&self, path: &str) -> Option<bool> {
        self.item(path)?.as_bool()
    }

    pub fn item_as_i64(&self, path: &str) -> Option<i64> {
        self.item(path)?.as_i64()
    }

    pub fn item_as_str(&self, path: &str) -> Option<&str> {
        self.item(path)?.as_str()
    }

    /// Returns the item as a list of strings; `None` if any element is not a string.
    pub fn item_as_string_list(&self, path: &str) -> Option<Vec<String>> {
        self.item(path)?
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    // == Canonical Form ==
    /// Deterministic compact JSON serialization of the recipe map.
    pub fn canonical_string(&self) -> Result<String> {
        serde_json::to_string(&self.map).map_err(|err| CacheError::KeyDerivation(err.to_string()))
    }
}

impl FromStr for Recipe {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json_str(s)
    }
}

impl From<Map<String, Value>> for Recipe {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

// == Helpers ==
/// Removes every `/* ... */` block. An unterminated block runs to the end.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(COMMENT_START) {
        out.push_str(&rest[..start]);
        let after = &rest[start + COMMENT_START.len()..];
        match after.find(COMMENT_END) {
            Some(end) => rest = &after[end + COMMENT_END.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
