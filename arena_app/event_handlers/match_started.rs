use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use arena_types::{errors::ApplicationError, matches::MatchState};

use crate::{
    event_handlers::helpers::write_live_snapshot,
    events::{EventHandler, EventHandlerContext, GameEvent, LiveMatchSnapshot},
};

pub struct MatchStartedEventHandler {
    participant_a: String,
    participant_b: String,
    started_at: DateTime<Utc>,
}

impl MatchStartedEventHandler {
    pub fn new(participant_a: String, participant_b: String, started_at: DateTime<Utc>) -> Self {
        Self {
            participant_a,
            participant_b,
            started_at,
        }
    }
}

#[async_trait]
impl EventHandler for MatchStartedEventHandler {
    #[instrument(skip_all, fields(
        event_kind = "started",
        match_id = %event.match_id,
    ))]
    async fn handle(
        &self,
        ctx: &EventHandlerContext,
        event: &GameEvent,
    ) -> Result<(), ApplicationError> {
        info!(started_at = %self.started_at, "Executing match started event");

        let snapshot = LiveMatchSnapshot {
            match_id: event.match_id,
            participant_a: self.participant_a.clone(),
            participant_b: self.participant_b.clone(),
            score_a: 0,
            score_b: 0,
            state: MatchState::Playing,
            updated_at: event.timestamp,
        };
        write_live_snapshot(ctx, &snapshot).await
    }
}
