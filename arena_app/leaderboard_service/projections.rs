use serde::{Serialize, de::DeserializeOwned};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheStore, cache_get, cache_set};

/// Cached views derived from a single board.
///
/// Every key written is recorded, so invalidation deletes exactly the
/// projections that exist. A generation counter is bumped on every
/// invalidation: a value computed under an older generation is never written.
pub struct ProjectionCache {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    state: Mutex<ProjectionState>,
}

#[derive(Default)]
struct ProjectionState {
    generation: u64,
    keys: HashSet<String>,
}

impl ProjectionCache {
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            state: Mutex::new(ProjectionState::default()),
        }
    }

    /// Must be taken before reading the board the projection is built from.
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Cached value, if any. Backend failures count as a miss.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match cache_get(self.cache.as_ref(), key).await {
            Ok(value) => {
                debug!(key, "Projection cache hit");
                Some(value)
            }
            Err(e) if e.is_cache_miss() => None,
            Err(e) => {
                warn!(key, "Unable to read projection: {}", e);
                None
            }
        }
    }

    /// Stores a projection computed at `generation`.
    pub async fn populate<T: Serialize>(&self, key: &str, value: &T, generation: u64) {
        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                debug!(key, "Board changed while reading, skipping projection");
                return;
            }
            state.keys.insert(key.to_string());
        }

        if let Err(e) = cache_set(self.cache.as_ref(), key, value, self.ttl).await {
            warn!(key, "Unable to write projection: {}", e);
            return;
        }

        // An invalidation may have run while writing.
        if self.generation().await != generation {
            self.delete(key).await;
        }
    }

    /// Drops every projection of the board.
    pub async fn invalidate(&self) {
        let keys = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            std::mem::take(&mut state.keys)
        };

        for key in &keys {
            self.delete(key).await;
        }
        debug!(count = keys.len(), "Projections invalidated");
    }

    pub async fn live_keys(&self) -> usize {
        self.state.lock().await.keys.len()
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, "Unable to delete projection: {}", e);
        }
    }
}
