use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use arena_types::errors::ApplicationError;

/// Key-value store with per-entry expiry.
///
/// `get` must fail with `AppError::CacheMiss` when the key is absent or
/// expired, and with any other error for backend failures.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), ApplicationError>;

    async fn get(&self, key: &str) -> Result<Value, ApplicationError>;

    async fn delete(&self, key: &str) -> Result<(), ApplicationError>;
}

/// Reads and decodes a cached value.
pub async fn cache_get<T: DeserializeOwned>(
    cache: &dyn CacheStore,
    key: &str,
) -> Result<T, ApplicationError> {
    let value = cache.get(key).await?;
    Ok(serde_json::from_value(value)?)
}

/// Encodes and stores a value.
pub async fn cache_set<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), ApplicationError> {
    let value = serde_json::to_value(value)?;
    cache.set(key, value, ttl).await
}

pub mod keys {
    use super::Uuid;

    pub fn live_match(match_id: Uuid) -> String {
        format!("match:{match_id}:live")
    }

    pub fn leaderboard(leaderboard_id: &str) -> String {
        format!("leaderboard:{leaderboard_id}")
    }

    pub fn top_entries(leaderboard_id: &str, count: usize) -> String {
        format!("leaderboard:{leaderboard_id}:top:{count}")
    }

    pub fn user_rank(leaderboard_id: &str, user_id: &str) -> String {
        format!("leaderboard:{leaderboard_id}:rank:{user_id}")
    }

    pub fn stats(leaderboard_id: &str) -> String {
        format!("leaderboard:{leaderboard_id}:stats")
    }
}
