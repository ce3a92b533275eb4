//! Result cache for finished recommendation lists.
//!
//! Values are JSON strings so any key/value store can sit behind the
//! trait. The recommender treats every cache failure as a miss.

use anyhow::Result;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const KEY_PREFIX: &str = "recs:";

/// Cache key for a user's recommendation list
pub fn cache_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}{user_id}")
}

/// Key/value cache with per-entry expiry
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache on a concurrent map.
///
/// Expired entries are dropped lazily when read, or in bulk by
/// [`InMemoryCache::purge_expired`].
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

impl ResultCache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            debug!("Cache entry {} expired", key);
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
