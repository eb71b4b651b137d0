use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Remembers recently ended matches so that snapshot events processed
/// after the `ended` event do not resurrect the live cache entry.
pub struct MatchFence {
    retention: Duration,
    ended: Mutex<HashMap<Uuid, Instant>>,
}

impl MatchFence {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            ended: Mutex::new(HashMap::new()),
        }
    }

    pub async fn seal(&self, match_id: Uuid) {
        let now = Instant::now();
        let mut ended = self.ended.lock().await;
        ended.retain(|_, sealed_at| now.duration_since(*sealed_at) < self.retention);
        ended.insert(match_id, now);
    }

    pub async fn is_sealed(&self, match_id: Uuid) -> bool {
        let ended = self.ended.lock().await;
        ended
            .get(&match_id)
            .is_some_and(|sealed_at| sealed_at.elapsed() < self.retention)
    }
}
