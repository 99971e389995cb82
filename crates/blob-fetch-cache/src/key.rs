//! Cache key derivation
//!
//! The on-disk filename for a cached object is the lowercase-hex SHA-256
//! digest of the UTF-8 bytes of its source URL. This mapping is part of the
//! on-disk format: changing the algorithm or the encoding orphans every
//! existing cache entry.

use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic, filesystem-safe identifier for a cached object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a source URL string.
    ///
    /// Pure and deterministic across platforms and restarts; any string is
    /// valid input, including the empty string.
    pub fn derive(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
