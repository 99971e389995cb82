//! Lookup-or-fetch-and-populate with per-key request coalescing
//!
//! The first caller to miss on a key becomes the flight leader: it spawns the
//! single authoritative fetch and every concurrent caller for the same key
//! attaches to that flight's outcome. Distinct keys never serialize against
//! each other; the only shared state is the in-flight registry.

use crate::decode::{BlobDecoder, RawDecoder};
use crate::error::{CacheError, Result};
use crate::fetcher::{FetchError, RemoteFetcher};
use crate::key::CacheKey;
use crate::store::ObjectStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Raw bytes from one completed flight, fanned out to every attached caller.
type FlightOutcome = Result<Vec<u8>>;

/// Receiver side of a flight: `None` until the leader publishes an outcome.
type FlightSlot = watch::Receiver<Option<FlightOutcome>>;

/// URL-keyed lookup-or-fetch cache over an [`ObjectStore`].
pub struct FetchCache<F, D = RawDecoder> {
    store: Arc<ObjectStore>,
    fetcher: Arc<F>,
    decoder: Arc<D>,
    inflight: Arc<Mutex<HashMap<CacheKey, FlightSlot>>>,
}

impl<F, D> Clone for FetchCache<F, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            decoder: Arc::clone(&self.decoder),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<F, D> FetchCache<F, D>
where
    F: RemoteFetcher,
    D: BlobDecoder,
{
    pub fn new(store: ObjectStore, fetcher: F, decoder: D) -> Self {
        Self {
            store: Arc::new(store),
            fetcher: Arc::new(fetcher),
            decoder: Arc::new(decoder),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the decoded object for `source`, fetching and persisting it on
    /// a miss.
    ///
    /// A hit never touches the network, even if the stored bytes fail to
    /// decode: the store is read once and trusted, and a decode failure on a
    /// hit is terminal for that call. On a miss the source must parse as a
    /// URL; concurrent misses for the same key share a single fetch.
    pub async fn get(&self, source: &str) -> Result<D::Output> {
        let key = CacheKey::derive(source);

        match self.store.read(&key).await {
            Ok(Some(bytes)) => {
                debug!(key = %key, size = bytes.len(), "cache hit");
                return self.decoder.decode(&bytes).map_err(CacheError::from);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, treating as miss");
            }
        }

        if url::Url::parse(source).is_err() {
            return Err(CacheError::InvalidKey(source.to_string()));
        }

        let bytes = self.fetch_coalesced(&key, source).await?;
        self.decoder.decode(&bytes).map_err(CacheError::from)
    }

    /// Join the in-flight fetch for `key`, starting one if none exists.
    async fn fetch_coalesced(&self, key: &CacheKey, source: &str) -> Result<Vec<u8>> {
        let mut rx = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some(rx) => {
                    debug!(key = %key, "joining in-flight fetch");
                    rx.clone()
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(key.clone(), rx.clone());
                    self.spawn_flight(key.clone(), source.to_string(), tx);
                    rx
                }
            }
        };

        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map(|value| (*value).clone())
            .map_err(|_| flight_lost())?;
        outcome.unwrap_or_else(|| Err(flight_lost()))
    }

    /// Run the authoritative fetch on a detached task, so a single abandoning
    /// caller never cancels the flight for the others attached to it.
    fn spawn_flight(
        &self,
        key: CacheKey,
        source: String,
        tx: watch::Sender<Option<FlightOutcome>>,
    ) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let decoder = Arc::clone(&self.decoder);
        let inflight = Arc::clone(&self.inflight);

        tokio::spawn(async move {
            let outcome = run_flight(&*store, &*fetcher, &*decoder, &key, &source).await;
            // Deregister before publishing so a failed key is back to idle by
            // the time any caller observes the failure.
            inflight.lock().await.remove(&key);
            let _ = tx.send(Some(outcome));
        });
    }
}

/// Fetch, validate, persist. A store write failure is logged and swallowed:
/// the caller still gets its bytes and the next lookup re-fetches.
async fn run_flight<F, D>(
    store: &ObjectStore,
    fetcher: &F,
    decoder: &D,
    key: &CacheKey,
    source: &str,
) -> FlightOutcome
where
    F: RemoteFetcher,
    D: BlobDecoder,
{
    debug!(key = %key, url = %source, "cache miss, fetching");

    let bytes = match fetcher.fetch(source).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(key = %key, url = %source, error = %err, "remote fetch failed");
            return Err(err.into());
        }
    };

    // Invalid bytes must never land on disk.
    if let Err(err) = decoder.decode(&bytes) {
        warn!(key = %key, url = %source, error = %err, "fetched bytes failed to decode");
        return Err(err.into());
    }

    if let Err(err) = store.write(key, &bytes).await {
        warn!(key = %key, error = %err, "failed to persist fetched object");
    }

    Ok(bytes)
}

fn flight_lost() -> CacheError {
    CacheError::FetchFailed(Arc::new(FetchError::Transport(
        "in-flight fetch ended without a result".into(),
    )))
}
