use async_trait::async_trait;
use tracing::{debug, instrument};

use arena_types::{errors::ApplicationError, matches::MatchState};

use crate::{
    event_handlers::helpers::write_live_snapshot,
    events::{EventHandler, EventHandlerContext, GameEvent, LiveMatchSnapshot},
};

pub struct ScoreUpdatedEventHandler {
    participant_a: String,
    participant_b: String,
    score_a: i64,
    score_b: i64,
}

impl ScoreUpdatedEventHandler {
    pub fn new(participant_a: String, participant_b: String, score_a: i64, score_b: i64) -> Self {
        Self {
            participant_a,
            participant_b,
            score_a,
            score_b,
        }
    }
}

#[async_trait]
impl EventHandler for ScoreUpdatedEventHandler {
    #[instrument(skip_all, fields(
        event_kind = "score_updated",
        match_id = %event.match_id,
        participant_id = ?event.participant_id,
        score_a = self.score_a,
        score_b = self.score_b,
    ))]
    async fn handle(
        &self,
        ctx: &EventHandlerContext,
        event: &GameEvent,
    ) -> Result<(), ApplicationError> {
        debug!("Refreshing live match snapshot");

        let snapshot = LiveMatchSnapshot {
            match_id: event.match_id,
            participant_a: self.participant_a.clone(),
            participant_b: self.participant_b.clone(),
            score_a: self.score_a,
            score_b: self.score_b,
            state: MatchState::Playing,
            updated_at: event.timestamp,
        };
        write_live_snapshot(ctx, &snapshot).await
    }
}
