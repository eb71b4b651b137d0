use serde_json::Value;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::debug;

use arena_app::cache::CacheStore;
use arena_types::errors::{AppError, ApplicationError};

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache with per-key expiry. Expired keys are dropped when
/// read or by `purge_expired`.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired key and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);

        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "Expired cache entries purged");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), ApplicationError> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Value, ApplicationError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                Err(AppError::CacheMiss(key.to_string()).into())
            }
            None => Err(AppError::CacheMiss(key.to_string()).into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ApplicationError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCacheStore::new();
        cache
            .set("k", json!({"score": 3}), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), json!({"score": 3}));

        cache.delete("k").await.unwrap();
        assert!(cache.get("k").await.unwrap_err().is_cache_miss());
        // Deleting a missing key is not an error.
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entries_miss() {
        let cache = InMemoryCacheStore::new();
        cache
            .set("short", json!(1), Duration::from_millis(10))
            .await
            .unwrap();
        cache
            .set("long", json!(2), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("short").await.unwrap_err().is_cache_miss());
        assert_eq!(cache.get("long").await.unwrap(), json!(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = InMemoryCacheStore::new();
        for key in ["a", "b"] {
            cache
                .set(key, json!(key), Duration::from_millis(10))
                .await
                .unwrap();
        }
        cache
            .set("c", json!("c"), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.len().await, 1);
    }
}
