use thiserror::Error;
use uuid::Uuid;

/// Errors for app logic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No event handler for {0}")]
    NoEventHandler(String),

    #[error("Event queue is full")]
    EventQueueFull,

    #[error("Event processor is not accepting events")]
    EventProcessorStopped,

    #[error("Cache miss for key '{0}'")]
    CacheMiss(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("No active match with ID {0}")]
    MatchNotFound(Uuid),

    #[error("Leaderboard '{0}' not found")]
    LeaderboardNotFound(String),

    #[error("Leaderboard '{0}' already exists")]
    LeaderboardAlreadyExists(String),
}
