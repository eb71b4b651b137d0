use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Averages are derived on read, only the totals are stored.
#[derive(Debug, Clone)]
pub struct UserStats {
    pub user_id: String,
    pub total_games: i32,
    pub wins: i32,
    pub losses: i32,
    pub total_score: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Match {
    pub id: Uuid,
    pub participant_a: String,
    pub participant_b: String,
    pub state: String,
    pub score_a: i64,
    pub score_b: i64,
    pub winner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub max_entries: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub leaderboard_id: String,
    pub user_id: String,
    pub display_name: String,
    pub score: i64,
    pub rank: i32,
    pub updated_at: DateTime<Utc>,
}
