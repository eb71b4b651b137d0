use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use arena_game::models::Match;
use arena_types::{
    errors::{AppError, ApplicationError, GameError},
    matches::{MatchResult, MatchState},
};

use crate::{
    events::{EventSender, GameEvent},
    repository::MatchRepository,
};

/// Tracks active matches and drives their lifecycle.
///
/// Every active match has its own lock, so transitions on different matches
/// never wait on each other. The map of active matches is locked separately
/// and only for insert, lookup and removal.
///
/// Transitions are validated on a copy of the match, persisted, and only then
/// applied, so a failed call leaves no trace. Transitions that emit an event
/// reserve a queue slot first: with a saturated queue the call fails with
/// `EventQueueFull` and nothing changes.
pub struct GameRegistry {
    matches: Arc<dyn MatchRepository>,
    events: EventSender,
    active: RwLock<HashMap<Uuid, Arc<Mutex<Match>>>>,
}

impl GameRegistry {
    pub fn new(matches: Arc<dyn MatchRepository>, events: EventSender) -> Self {
        Self {
            matches,
            events,
            active: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_match(
        &self,
        participant_a: &str,
        participant_b: &str,
    ) -> Result<Match, ApplicationError> {
        let game = Match::new(participant_a, participant_b)?;
        self.matches.save(&game).await?;

        self.active
            .write()
            .await
            .insert(game.id, Arc::new(Mutex::new(game.clone())));

        info!(match_id = %game.id, participant_a, participant_b, "Match created");
        Ok(game)
    }

    pub async fn start_match(&self, match_id: Uuid) -> Result<Match, ApplicationError> {
        let entry = self.lookup(match_id).await?;
        let mut game = entry.lock().await;

        let mut next = game.clone();
        next.start()?;

        let slot = self.events.try_reserve()?;
        self.matches.save(&next).await?;
        *game = next;
        slot.send(GameEvent::started(&game));

        info!(match_id = %match_id, "Match started");
        Ok(game.clone())
    }

    /// Sets a participant's score. The event is emitted even when the
    /// score did not change.
    pub async fn update_score(
        &self,
        match_id: Uuid,
        participant_id: &str,
        score: i64,
    ) -> Result<Match, ApplicationError> {
        let entry = self.lookup(match_id).await?;
        let mut game = entry.lock().await;

        let mut next = game.clone();
        next.set_score(participant_id, score)?;

        let slot = self.events.try_reserve()?;
        self.matches.save(&next).await?;
        *game = next;
        slot.send(GameEvent::score_updated(&game, participant_id));

        debug!(match_id = %match_id, participant_id, score, "Score updated");
        Ok(game.clone())
    }

    pub async fn end_match(&self, match_id: Uuid) -> Result<MatchResult, ApplicationError> {
        let entry = self.lookup(match_id).await?;
        let mut game = entry.lock().await;

        let mut next = game.clone();
        let result = next.finish()?;

        let slot = self.events.try_reserve()?;
        self.matches.save(&next).await?;
        *game = next;
        self.active.write().await.remove(&match_id);
        slot.send(GameEvent::ended(&result));

        info!(
            match_id = %match_id,
            winner_id = ?result.winner_id,
            is_tie = result.is_tie,
            duration_secs = result.duration_secs,
            "Match ended"
        );
        Ok(result)
    }

    /// Cancels a waiting or playing match. No event is emitted, so
    /// cancellations never touch statistics or leaderboards.
    pub async fn cancel_match(&self, match_id: Uuid) -> Result<Match, ApplicationError> {
        let entry = match self.lookup(match_id).await {
            Ok(entry) => entry,
            Err(e) => return Err(self.explain_inactive(match_id, e).await),
        };
        let mut game = entry.lock().await;

        let mut next = game.clone();
        next.cancel()?;

        self.matches.save(&next).await?;
        *game = next;
        self.active.write().await.remove(&match_id);

        info!(match_id = %match_id, "Match cancelled");
        Ok(game.clone())
    }

    /// Returns the live state of an active match, or the stored one once it
    /// left the registry.
    pub async fn get_match(&self, match_id: Uuid) -> Result<Match, ApplicationError> {
        match self.lookup(match_id).await {
            Ok(entry) => Ok(entry.lock().await.clone()),
            Err(_) => self.matches.get_by_id(match_id).await,
        }
    }

    pub async fn active_matches(&self) -> Vec<Match> {
        let entries: Vec<_> = self.active.read().await.values().cloned().collect();

        let mut matches = Vec::with_capacity(entries.len());
        for entry in entries {
            let game = entry.lock().await;
            if !game.state.is_terminal() {
                matches.push(game.clone());
            }
        }
        matches
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    async fn lookup(&self, match_id: Uuid) -> Result<Arc<Mutex<Match>>, ApplicationError> {
        self.active
            .read()
            .await
            .get(&match_id)
            .cloned()
            .ok_or_else(|| AppError::MatchNotFound(match_id).into())
    }

    /// A match missing from the registry may still be stored: a finished one
    /// reports `AlreadyFinished` instead of a bare not-found.
    async fn explain_inactive(&self, match_id: Uuid, not_found: ApplicationError) -> ApplicationError {
        match self.matches.get_by_id(match_id).await {
            Ok(stored) if stored.state == MatchState::Finished => {
                GameError::AlreadyFinished(match_id).into()
            }
            Ok(stored) => GameError::InvalidTransition {
                from: stored.state,
                action: "cancel",
            }
            .into(),
            Err(_) => not_found,
        }
    }
}
