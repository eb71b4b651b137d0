use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use arena_game::models::Match;
use arena_types::matches::{MatchResult, MatchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    Started,
    ScoreUpdated,
    Ended,
}

impl GameEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameEventKind::Started => "started",
            GameEventKind::ScoreUpdated => "score_updated",
            GameEventKind::Ended => "ended",
        }
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data carried by each kind of event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventPayload {
    Started {
        participant_a: String,
        participant_b: String,
        started_at: DateTime<Utc>,
    },
    /// Both scores after the update, plus the value that was submitted.
    ScoreUpdated {
        participant_a: String,
        participant_b: String,
        score_a: i64,
        score_b: i64,
        score: i64,
    },
    Ended(MatchResult),
}

impl GameEventPayload {
    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEventPayload::Started { .. } => GameEventKind::Started,
            GameEventPayload::ScoreUpdated { .. } => GameEventKind::ScoreUpdated,
            GameEventPayload::Ended(_) => GameEventKind::Ended,
        }
    }
}

/// Something that happened to a match, handled once by the event processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: Uuid,
    pub match_id: Uuid,
    pub participant_id: Option<String>,
    pub payload: GameEventPayload,
    pub timestamp: DateTime<Utc>,
}

impl GameEvent {
    fn new(match_id: Uuid, participant_id: Option<String>, payload: GameEventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            participant_id,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn started(game: &Match) -> Self {
        Self::new(
            game.id,
            None,
            GameEventPayload::Started {
                participant_a: game.participant_a.clone(),
                participant_b: game.participant_b.clone(),
                started_at: game.started_at.unwrap_or_else(Utc::now),
            },
        )
    }

    pub fn score_updated(game: &Match, participant_id: &str) -> Self {
        Self::new(
            game.id,
            Some(participant_id.to_string()),
            GameEventPayload::ScoreUpdated {
                participant_a: game.participant_a.clone(),
                participant_b: game.participant_b.clone(),
                score_a: game.score_a,
                score_b: game.score_b,
                score: game.score_of(participant_id).unwrap_or_default(),
            },
        )
    }

    pub fn ended(result: &MatchResult) -> Self {
        Self::new(
            result.match_id,
            result.winner_id.clone(),
            GameEventPayload::Ended(result.clone()),
        )
    }

    pub fn kind(&self) -> GameEventKind {
        self.payload.kind()
    }
}

/// In-progress view of a match kept in the cache for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMatchSnapshot {
    pub match_id: Uuid,
    pub participant_a: String,
    pub participant_b: String,
    pub score_a: i64,
    pub score_b: i64,
    pub state: MatchState,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_game::test_utils::{MatchFactoryOptions, match_factory};

    #[test]
    fn test_events_carry_match_snapshots() {
        let game = match_factory(MatchFactoryOptions {
            participant_a: Some("p1"),
            participant_b: Some("p2"),
            state: Some(MatchState::Playing),
            score_a: Some(12),
            score_b: Some(7),
        });

        let started = GameEvent::started(&game);
        assert_eq!(started.kind(), GameEventKind::Started);
        assert_eq!(started.match_id, game.id);
        assert!(started.participant_id.is_none());

        let updated = GameEvent::score_updated(&game, "p2");
        assert_eq!(updated.kind().as_str(), "score_updated");
        assert_eq!(updated.participant_id.as_deref(), Some("p2"));
        assert!(matches!(
            updated.payload,
            GameEventPayload::ScoreUpdated {
                score_a: 12,
                score_b: 7,
                score: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_ended_event_is_attributed_to_winner() {
        let mut game = match_factory(MatchFactoryOptions {
            state: Some(MatchState::Playing),
            score_a: Some(3),
            score_b: Some(9),
            ..Default::default()
        });
        let result = game.finish().unwrap();

        let event = GameEvent::ended(&result);
        assert_eq!(event.kind(), GameEventKind::Ended);
        assert_eq!(event.participant_id.as_deref(), Some("player_b"));
        assert_eq!(event.payload, GameEventPayload::Ended(result));
    }
}
