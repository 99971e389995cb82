//! Flat-directory blob storage
//!
//! One file per object, filename = cache key, contents = raw bytes, no
//! sidecar metadata. Writes land in a uniquely named temp file in the same
//! directory and are renamed into place, so a concurrent read never observes
//! a partially written object.

use crate::key::CacheKey;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info};

/// Durable byte-blob storage addressed by [`CacheKey`].
#[derive(Debug)]
pub struct ObjectStore {
    cache_dir: PathBuf,
    /// Disambiguates temp files when two writers race on the same key.
    tmp_counter: AtomicU64,
}

impl ObjectStore {
    /// Open a store rooted at `cache_dir`, creating the directory if absent.
    pub async fn open(cache_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).await?;
        info!(cache_dir = ?cache_dir, "object store ready");
        Ok(Self {
            cache_dir,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn object_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.as_str())
    }

    /// Whether an object exists under `key`. Does not validate contents.
    pub async fn has(&self, key: &CacheKey) -> bool {
        fs::try_exists(self.object_path(key)).await.unwrap_or(false)
    }

    /// Read the full blob stored under `key`, or `None` if absent.
    pub async fn read(&self, key: &CacheKey) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.object_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Persist `bytes` under `key`, replacing any previous object wholesale.
    ///
    /// The blob is written to a temp file in the cache directory and renamed
    /// into place; readers see either the old complete object or the new one,
    /// never a partial write.
    pub async fn write(&self, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        let path = self.object_path(key);
        let seq = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .cache_dir
            .join(format!("{}.{}.{}.tmp", key, std::process::id(), seq));

        if let Err(err) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err);
        }
        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err);
        }

        debug!(key = %key, size = bytes.len(), "stored blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).await.unwrap();
        let key = CacheKey::derive("https://example.com/a.jpg");

        store.write(&key, &[0x01, 0x02]).await.unwrap();

        assert!(store.has(&key).await);
        assert_eq!(store.read(&key).await.unwrap(), Some(vec![0x01, 0x02]));
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).await.unwrap();
        let key = CacheKey::derive("https://example.com/missing.jpg");

        assert!(!store.has(&key).await);
        assert_eq!(store.read(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("cache").join("images");
        let store = ObjectStore::open(nested.clone()).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.cache_dir(), nested.as_path());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_object_wholesale() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).await.unwrap();
        let key = CacheKey::derive("https://example.com/a.jpg");

        store.write(&key, b"first").await.unwrap();
        store.write(&key, b"second-longer").await.unwrap();

        assert_eq!(
            store.read(&key).await.unwrap(),
            Some(b"second-longer".to_vec())
        );
    }

    #[tokio::test]
    async fn test_interrupted_write_is_invisible_to_readers() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).await.unwrap();
        let key = CacheKey::derive("https://example.com/a.jpg");

        // A crash between write-temp and rename leaves only a temp file.
        let stranded = dir.path().join(format!("{}.999.0.tmp", key));
        std::fs::write(&stranded, b"partial").unwrap();

        assert!(!store.has(&key).await);
        assert_eq!(store.read(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files_behind() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::open(dir.path()).await.unwrap();
        let key = CacheKey::derive("https://example.com/a.jpg");

        store.write(&key, &[0xAA; 128]).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![key.as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_write_into_removed_directory_fails() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("gone");
        let store = ObjectStore::open(root.clone()).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let key = CacheKey::derive("https://example.com/a.jpg");
        assert!(store.write(&key, b"bytes").await.is_err());
    }
}
