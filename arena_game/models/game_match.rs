use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arena_types::{
    errors::GameError,
    matches::{MatchResult, MatchState},
};

/// A single match between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub participant_a: String,
    pub participant_b: String,
    pub state: MatchState,
    pub score_a: i64,
    pub score_b: i64,
    pub winner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Sets up a new match in `Waiting` state.
    pub fn new(participant_a: &str, participant_b: &str) -> Result<Self, GameError> {
        let participant_a = participant_a.trim();
        let participant_b = participant_b.trim();

        if participant_a.is_empty() || participant_b.is_empty() {
            return Err(GameError::InvalidParticipant(
                "participant id cannot be empty".to_string(),
            ));
        }
        if participant_a == participant_b {
            return Err(GameError::InvalidParticipant(format!(
                "{participant_a} cannot play against itself"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            participant_a: participant_a.to_string(),
            participant_b: participant_b.to_string(),
            state: MatchState::Waiting,
            score_a: 0,
            score_b: 0,
            winner_id: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        })
    }

    pub fn is_participant(&self, participant_id: &str) -> bool {
        participant_id == self.participant_a || participant_id == self.participant_b
    }

    pub fn score_of(&self, participant_id: &str) -> Option<i64> {
        if participant_id == self.participant_a {
            Some(self.score_a)
        } else if participant_id == self.participant_b {
            Some(self.score_b)
        } else {
            None
        }
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        self.ensure_state(MatchState::Waiting, "start")?;
        self.state = MatchState::Playing;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Overwrites the score of one participant. Only allowed while playing.
    pub fn set_score(&mut self, participant_id: &str, score: i64) -> Result<(), GameError> {
        self.ensure_state(MatchState::Playing, "update the score of")?;

        if !self.is_participant(participant_id) {
            return Err(GameError::InvalidParticipant(format!(
                "{participant_id} is not playing in match {}",
                self.id
            )));
        }
        if score < 0 {
            return Err(GameError::InvalidScore(score));
        }

        if participant_id == self.participant_a {
            self.score_a = score;
        } else {
            self.score_b = score;
        }
        Ok(())
    }

    /// Closes the match and derives the winner: the strictly higher score
    /// wins, equal scores are a tie.
    pub fn finish(&mut self) -> Result<MatchResult, GameError> {
        self.ensure_state(MatchState::Playing, "end")?;

        let now = Utc::now();
        self.state = MatchState::Finished;
        self.finished_at = Some(now);

        let (winner, loser) = match self.score_a.cmp(&self.score_b) {
            std::cmp::Ordering::Greater => (
                Some((self.participant_a.clone(), self.score_a)),
                Some((self.participant_b.clone(), self.score_b)),
            ),
            std::cmp::Ordering::Less => (
                Some((self.participant_b.clone(), self.score_b)),
                Some((self.participant_a.clone(), self.score_a)),
            ),
            std::cmp::Ordering::Equal => (None, None),
        };
        self.winner_id = winner.as_ref().map(|(id, _)| id.clone());

        Ok(MatchResult {
            match_id: self.id,
            participant_a: self.participant_a.clone(),
            participant_b: self.participant_b.clone(),
            score_a: self.score_a,
            score_b: self.score_b,
            is_tie: winner.is_none(),
            winner_score: winner.as_ref().map(|(_, score)| *score),
            loser_score: loser.as_ref().map(|(_, score)| *score),
            winner_id: winner.map(|(id, _)| id),
            loser_id: loser.map(|(id, _)| id),
            duration_secs: self.duration_secs(),
        })
    }

    pub fn cancel(&mut self) -> Result<(), GameError> {
        match self.state {
            MatchState::Finished => Err(GameError::AlreadyFinished(self.id)),
            MatchState::Cancelled => Err(GameError::InvalidTransition {
                from: self.state,
                action: "cancel",
            }),
            MatchState::Waiting | MatchState::Playing => {
                self.state = MatchState::Cancelled;
                self.finished_at = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Seconds between start and finish, zero when either is missing.
    pub fn duration_secs(&self) -> i64 {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => (finished - started).num_seconds(),
            _ => 0,
        }
    }

    fn ensure_state(&self, expected: MatchState, action: &'static str) -> Result<(), GameError> {
        if self.state != expected {
            return Err(GameError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        Ok(())
    }
}
