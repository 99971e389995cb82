//! Caller-visible error taxonomy for cache lookups
//!
//! Store persistence failures are deliberately absent: they are logged and
//! swallowed inside the cache, degrading to "no caching occurred this time"
//! so the next lookup misses and re-fetches. No fault here is process-fatal.

use crate::decode::DecodeError;
use crate::fetcher::FetchError;
use std::fmt;
use std::sync::Arc;

/// Errors surfaced by [`crate::FetchCache::get`].
///
/// Cheap to clone so one in-flight outcome can fan out to every coalesced
/// caller.
#[derive(Debug, Clone)]
pub enum CacheError {
    /// The source string is not a well-formed resource locator.
    InvalidKey(String),
    /// Network retrieval failed; the cause is shared across coalesced callers.
    FetchFailed(Arc<FetchError>),
    /// Bytes were retrieved (or read back) but are not a valid object.
    DecodeFailed(DecodeError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidKey(source) => write!(f, "invalid source key: {}", source),
            CacheError::FetchFailed(err) => write!(f, "fetch failed: {}", err),
            CacheError::DecodeFailed(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::FetchFailed(err) => Some(err.as_ref()),
            CacheError::DecodeFailed(err) => Some(err),
            CacheError::InvalidKey(_) => None,
        }
    }
}

impl From<DecodeError> for CacheError {
    fn from(err: DecodeError) -> Self {
        CacheError::DecodeFailed(err)
    }
}

impl From<FetchError> for CacheError {
    fn from(err: FetchError) -> Self {
        CacheError::FetchFailed(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
