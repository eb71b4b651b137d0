use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// How a single finished match went for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Win,
    Loss,
    Tie,
}

/// Aggregate per-user statistics across finished matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub total_games: u32,
    pub wins: u32,
    pub losses: u32,
    pub total_score: i64,
    pub average_score: f64,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_games: 0,
            wins: 0,
            losses: 0,
            total_score: 0,
            average_score: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Folds one finished match into the aggregates. Ties only count
    /// towards games played and scoring.
    pub fn record_match(&mut self, score: i64, outcome: MatchOutcome) {
        self.total_games += 1;
        self.total_score = self.total_score.saturating_add(score);
        self.average_score = self.total_score as f64 / self.total_games as f64;

        match outcome {
            MatchOutcome::Win => self.wins += 1,
            MatchOutcome::Loss => self.losses += 1,
            MatchOutcome::Tie => {}
        }

        self.updated_at = Utc::now();
    }
}
