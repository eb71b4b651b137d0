use arena_types::errors::ApplicationError;

use crate::{
    event_handlers::{
        MatchEndedEventHandler, MatchStartedEventHandler, ScoreUpdatedEventHandler,
    },
    events::{EventHandler, EventRegistry, GameEvent, GameEventPayload},
};

/// This is the concrete implementation of the EventRegistry trait.
/// It maps each event payload to the handler owning its side effects.
#[derive(Default)]
pub struct AppEventRegistry;

impl AppEventRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl EventRegistry for AppEventRegistry {
    fn get_handler(&self, event: &GameEvent) -> Result<Box<dyn EventHandler>, ApplicationError> {
        match &event.payload {
            GameEventPayload::Started {
                participant_a,
                participant_b,
                started_at,
            } => Ok(Box::new(MatchStartedEventHandler::new(
                participant_a.clone(),
                participant_b.clone(),
                *started_at,
            ))),
            GameEventPayload::ScoreUpdated {
                participant_a,
                participant_b,
                score_a,
                score_b,
                ..
            } => Ok(Box::new(ScoreUpdatedEventHandler::new(
                participant_a.clone(),
                participant_b.clone(),
                *score_a,
                *score_b,
            ))),
            GameEventPayload::Ended(result) => {
                Ok(Box::new(MatchEndedEventHandler::new(result.clone())))
            }
        }
    }
}
