//! In-memory response cache with stale-read fallback.
//!
//! Entries are never evicted on a schedule. An expired entry stays readable
//! through [`CacheStore::get_stale`] until a newer write replaces it, so a
//! failing upstream degrades to the last payload we saw.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
}

impl CacheInner {
    fn get_fresh(&self, key: &str, now: Instant) -> Option<Value> {
        self.map
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .map(|entry| entry.payload.clone())
    }

    fn get_stale(&self, key: &str) -> Option<Value> {
        self.map.get(key).map(|entry| entry.payload.clone())
    }

    fn set(&mut self, key: String, payload: Value, ttl: Duration, stored_at: Instant) {
        self.map.insert(
            key,
            CacheEntry {
                payload,
                stored_at,
                ttl,
            },
        );
    }
}

/// Thread-safe keyed store of timestamped JSON payloads.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload for `key` only while it is within its TTL.
    pub async fn get_fresh(&self, key: &str) -> Option<Value> {
        self.get_fresh_at(key, Instant::now()).await
    }

    pub async fn get_fresh_at(&self, key: &str, now: Instant) -> Option<Value> {
        let store = self.inner.read().await;
        store.get_fresh(key, now)
    }

    /// Returns the payload for `key` regardless of expiry.
    pub async fn get_stale(&self, key: &str) -> Option<Value> {
        let store = self.inner.read().await;
        store.get_stale(key)
    }

    /// Overwrites any existing entry for `key`, stamping it with the current time.
    pub async fn set(&self, key: impl Into<String>, payload: Value, ttl: Duration) {
        self.set_at(key, payload, ttl, Instant::now()).await;
    }

    pub async fn set_at(
        &self,
        key: impl Into<String>,
        payload: Value,
        ttl: Duration,
        stored_at: Instant,
    ) {
        let mut store = self.inner.write().await;
        store.set(key.into(), payload, ttl, stored_at);
    }

    /// Drops a single entry, including its stale fallback.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut store = self.inner.write().await;
        store.map.remove(key).is_some()
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of entries, fresh and stale.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn keys(&self) -> Vec<String> {
        let store = self.inner.read().await;
        let mut keys = store.map.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}
