//! URL-keyed on-disk blob cache
//!
//! Stores fetched binary objects in a flat directory, one file per object,
//! keyed by the SHA-256 of the source URL. Writes are atomic (temp file plus
//! rename) and concurrent lookups for the same key coalesce onto a single
//! network fetch.

mod cache;
mod decode;
mod error;
mod fetcher;
mod key;
mod store;

pub use cache::FetchCache;
pub use decode::{BlobDecoder, DecodeError, RawDecoder};
pub use error::{CacheError, Result};
pub use fetcher::{FetchError, RemoteFetcher};
pub use key::CacheKey;
pub use store::ObjectStore;
