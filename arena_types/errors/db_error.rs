use thiserror::Error;
use uuid::Uuid;

/// Errors for storage collaborators.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Match with ID {0} not found")]
    MatchNotFound(Uuid),

    #[error("User with ID '{0}' not found")]
    UserNotFound(String),

    #[error("Stats for user '{0}' not found")]
    UserStatsNotFound(String),

    #[error("Leaderboard with ID '{0}' not found")]
    LeaderboardNotFound(String),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
