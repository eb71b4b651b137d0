use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a match: `Waiting -> Playing -> {Finished, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchState {
    Waiting,
    Playing,
    Finished,
    Cancelled,
}

impl MatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchState::Finished | MatchState::Cancelled)
    }
}

/// Summary produced when a match ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: Uuid,
    pub participant_a: String,
    pub participant_b: String,
    pub score_a: i64,
    pub score_b: i64,
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
    pub winner_score: Option<i64>,
    pub loser_score: Option<i64>,
    pub duration_secs: i64,
    pub is_tie: bool,
}

impl MatchResult {
    /// Score a given participant ended the match with.
    pub fn score_of(&self, participant_id: &str) -> Option<i64> {
        if participant_id == self.participant_a {
            Some(self.score_a)
        } else if participant_id == self.participant_b {
            Some(self.score_b)
        } else {
            None
        }
    }
}
