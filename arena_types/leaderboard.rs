use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Informational period a leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaderboardKind {
    Global,
    Weekly,
    Monthly,
    Seasonal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub score: i64,
    /// 1-based position, reassigned on every mutation.
    pub rank: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardStats {
    pub count: usize,
    pub average_score: f64,
    pub max_score: i64,
    pub min_score: i64,
    pub last_updated: DateTime<Utc>,
}
