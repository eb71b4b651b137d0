use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use arena_types::leaderboard::LeaderboardEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardUpdate {
    pub leaderboard_id: String,
    pub kind: UpdateKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateKind {
    ScoreUpdated {
        user_id: String,
        display_name: String,
        score: i64,
        old_rank: Option<u32>,
        new_rank: u32,
    },
    UserRemoved {
        user_id: String,
        old_rank: u32,
    },
    Refreshed {
        entries: Vec<LeaderboardEntry>,
    },
}

/// Receiving end of a leaderboard subscription. The stream ends once the
/// subscription is cancelled.
pub struct Subscription {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<LeaderboardUpdate>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<LeaderboardUpdate> {
        self.receiver.recv().await
    }
}

/// Subscribers of one board, each with its own bounded buffer.
pub struct Subscribers {
    buffer: usize,
    senders: RwLock<HashMap<Uuid, mpsc::Sender<LeaderboardUpdate>>>,
}

impl Subscribers {
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            senders: RwLock::new(HashMap::new()),
        }
    }

    pub async fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.senders.write().await.insert(id, tx);
        Subscription { id, receiver }
    }

    /// Drops the sender, which closes the subscriber's stream.
    pub async fn unsubscribe(&self, id: Uuid) -> bool {
        self.senders.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Best-effort fan-out: a subscriber with a full buffer misses this
    /// update, closed subscribers are removed. Returns the number of
    /// subscribers that received it.
    pub async fn publish(&self, update: &LeaderboardUpdate) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let senders = self.senders.read().await;
            for (id, tx) in senders.iter() {
                match tx.try_send(update.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(subscriber_id = %id, "Subscriber buffer full, update dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut senders = self.senders.write().await;
            for id in &closed {
                senders.remove(id);
            }
            debug!(pruned = closed.len(), "Closed subscribers removed");
        }
        delivered
    }
}
