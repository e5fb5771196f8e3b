//! Expiring on-disk response cache.
//!
//! One JSON file per key under the cache directory, holding the write
//! timestamp and the payload. Entries older than the TTL are treated as
//! missing and removed when read. Every I/O or decode failure degrades to a
//! cache miss; nothing here returns an error to the fetch path.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: DateTime<Utc>,
    payload: serde_json::Value,
}

/// Cache key for a request URL within a namespace (`search`, `device`).
pub fn cache_key(namespace: &str, url: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{namespace}:{url}").as_bytes()))
}

/// Per-key JSON file cache with lazy expiry.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self { dir: dir.into(), ttl }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Returns the payload for `key` if present and fresh.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now()).await
    }

    /// Like [`get`](Self::get), evaluating freshness against `now`.
    pub async fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let path = self.path_for(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Cache read failed for {}: {}", path.display(), e);
                }
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Corrupt cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        // Future timestamps (clock skew) count as fresh
        let age = (now - entry.timestamp).to_std().unwrap_or(Duration::ZERO);
        if age > self.ttl {
            debug!("Cache entry expired ({}s old): {}", age.as_secs(), key);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!("Failed to remove expired entry {}: {}", path.display(), e);
            }
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                debug!("Cache payload did not decode for {}: {}", key, e);
                None
            }
        }
    }

    /// Stores `value` under `key`.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        self.put_at(key, value, Utc::now()).await
    }

    /// Like [`put`](Self::put), stamping the entry with `timestamp`.
    pub async fn put_at<T: Serialize>(&self, key: &str, value: &T, timestamp: DateTime<Utc>) {
        if let Err(e) = self.write(key, value, timestamp).await {
            warn!("Cache write failed for {}: {:#}", key, e);
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, timestamp: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry { timestamp, payload: serde_json::to_value(value)? };
        let json = serde_json::to_vec(&entry)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create cache dir: {}", self.dir.display()))?;
        tokio::fs::write(self.path_for(key), json).await.context("Failed to write cache entry")?;

        debug!("Cached: {}", key);
        Ok(())
    }

    /// Removes every entry. Returns how many files were deleted.
    pub async fn clear(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read cache dir: {}", self.dir.display()))
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                removed += 1;
            }
        }

        debug!("Cleared {} cache entries", removed);
        Ok(removed)
    }
}
