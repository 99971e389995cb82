//! Recipe image cache warmer
//!
//! Runs each URL given on the command line through the on-disk blob cache:
//! already-cached images are served from disk, everything else is fetched
//! and persisted. Exits non-zero if any URL failed.
//!
//! Configuration comes from the environment: `CACHE_DIR` selects the cache
//! directory (default `./cache/images`), `RUST_LOG` controls log filtering.

use blob_fetch_cache::{FetchCache, ObjectStore, RawDecoder};
use http_blob_fetcher::HttpBlobFetcher;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recipe_prefetch=info,blob_fetch_cache=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cache_dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./cache/images"));

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        error!("usage: recipe-prefetch <url>...");
        return ExitCode::from(2);
    }

    let store = match ObjectStore::open(cache_dir.clone()).await {
        Ok(store) => store,
        Err(err) => {
            error!(cache_dir = ?cache_dir, error = %err, "failed to open cache directory");
            return ExitCode::FAILURE;
        }
    };

    info!(cache_dir = ?cache_dir, urls = urls.len(), "warming cache");
    let cache = Arc::new(FetchCache::new(store, HttpBlobFetcher::new(), RawDecoder));

    let mut handles = Vec::new();
    for url in urls {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let result = cache.get(&url).await;
            (url, result)
        }));
    }

    let mut failures = 0usize;
    for handle in handles {
        match handle.await {
            Ok((url, Ok(bytes))) => info!(url = %url, size = bytes.len(), "cached"),
            Ok((url, Err(err))) => {
                failures += 1;
                error!(url = %url, error = %err, "failed");
            }
            Err(err) => {
                failures += 1;
                error!(error = %err, "prefetch task panicked");
            }
        }
    }

    if failures > 0 {
        error!(failures, "some URLs could not be cached");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
