use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::Cache;

/// Get the platform-appropriate cache directory for scan results
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("shelf-score/scans"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/shelf-score/scans",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Remove the whole cache directory
pub fn clear_cache(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Serializable representation of a cache entry for disk storage
#[derive(Serialize, Deserialize)]
struct DiskEntry<V> {
    stored_at: u64, // Unix timestamp
    ttl_secs: u64,
    value: V,
}

impl<V> DiskEntry<V> {
    fn is_fresh(&self, now: u64) -> bool {
        now < self.stored_at.saturating_add(self.ttl_secs)
    }
}

/// Persistent TTL cache backed by cacache, with JSON-encoded entries.
///
/// I/O and decode errors are logged and otherwise ignored.
pub struct DiskCache<V> {
    cache_path: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> DiskCache<V> {
    pub fn new(cache_path: PathBuf) -> Self {
        Self {
            cache_path,
            _value: PhantomData,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl<V> Cache<V> for DiskCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Option<V> {
        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;

        let entry: DiskEntry<V> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key, error = %e, "dropping unreadable cache entry");
                let _ = cacache::remove_sync(&self.cache_path, key);
                return None;
            }
        };

        if !entry.is_fresh(unix_now()) {
            tracing::debug!(key, "cache entry expired");
            let _ = cacache::remove_sync(&self.cache_path, key);
            return None;
        }

        Some(entry.value)
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = DiskEntry {
            stored_at: unix_now(),
            ttl_secs: ttl.as_secs(),
            value,
        };

        // Fire-and-forget: a failed write only costs a refetch later
        match serde_json::to_vec(&entry) {
            Ok(serialized) => {
                if let Err(e) = cacache::write_sync(&self.cache_path, key, serialized) {
                    tracing::debug!(key, error = %e, "cache write failed");
                }
            }
            Err(e) => tracing::debug!(key, error = %e, "cache entry not serializable"),
        }
    }

    fn clear(&self) {
        if let Err(e) = cacache::clear_sync(&self.cache_path) {
            tracing::debug!(error = %e, "cache clear failed");
        }
    }
}
