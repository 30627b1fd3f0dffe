//! Cache Key Derivation
//!
//! `key = b64(sha1(canonical(recipe))) ++ b64(sha1(param_0)) ++ ... ++ b64(sha1(param_n))`
//!
//! Each segment is standard padded base64 followed by a line feed, the same
//! bytes a MIME-style encoder emits for a 20-byte digest. Keys produced by
//! other clients of the same cache store therefore match byte for byte. Every
//! segment is exactly 29 characters long, so the boundaries stay unambiguous.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha1::{Digest, Sha1};

use crate::error::Result;
use crate::recipe::Recipe;

/// Length of one base64-encoded SHA-1 digest, trailing line feed included.
pub const SEGMENT_LEN: usize = 29;

/// Derives the cache key for a recipe and its ordered parameters.
///
/// Parameter order is significant.
pub fn derive_key<S: AsRef<str>>(recipe: &Recipe, params: &[S]) -> Result<String> {
    let canonical = recipe.canonical_string()?;

    let mut key = String::with_capacity(SEGMENT_LEN * (params.len() + 1));
    key.push_str(&sha1_base64(canonical.as_bytes()));
    for param in params {
        key.push_str(&sha1_base64(param.as_ref().as_bytes()));
    }
    Ok(key)
}

fn sha1_base64(bytes: &[u8]) -> String {
    let mut segment = BASE64.encode(Sha1::digest(bytes));
    segment.push('\n');
    segment
}
