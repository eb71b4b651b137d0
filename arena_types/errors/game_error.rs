use thiserror::Error;
use uuid::Uuid;

use crate::matches::MatchState;

/// Errors for domain logic (match and ranking rules).
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),

    #[error("Cannot {action} a match in {from:?} state")]
    InvalidTransition {
        from: MatchState,
        action: &'static str,
    },

    #[error("Match {0} is already finished")]
    AlreadyFinished(Uuid),

    #[error("Invalid score {0}: scores must be non-negative")]
    InvalidScore(i64),

    #[error("Leaderboard {leaderboard_id} is full (lowest score {lowest_score})")]
    LeaderboardFull {
        leaderboard_id: String,
        lowest_score: i64,
    },

    #[error("User {user_id} is not ranked on leaderboard {leaderboard_id}")]
    EntryNotFound {
        leaderboard_id: String,
        user_id: String,
    },
}
