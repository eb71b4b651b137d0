use async_trait::async_trait;
use tracing::{info, instrument, warn};

use arena_types::{
    common::{MatchOutcome, UserStats},
    errors::ApplicationError,
    matches::MatchResult,
};

use crate::{
    cache::keys,
    events::{EventHandler, EventHandlerContext, GameEvent},
};

pub struct MatchEndedEventHandler {
    result: MatchResult,
}

impl MatchEndedEventHandler {
    pub fn new(result: MatchResult) -> Self {
        Self { result }
    }

    fn outcome_for(&self, participant_id: &str) -> MatchOutcome {
        match self.result.winner_id.as_deref() {
            None => MatchOutcome::Tie,
            Some(winner) if winner == participant_id => MatchOutcome::Win,
            Some(_) => MatchOutcome::Loss,
        }
    }

    async fn update_stats(
        &self,
        ctx: &EventHandlerContext,
        participant_id: &str,
    ) -> Result<(), ApplicationError> {
        // Concurrent `ended` events may share this participant.
        let _guard = ctx.user_locks.lock(participant_id).await;

        let mut stats = match ctx.users.get_stats(participant_id).await {
            Ok(stats) => stats,
            Err(e) if e.is_not_found() => UserStats::new(participant_id),
            Err(e) => return Err(e),
        };

        let score = self.result.score_of(participant_id).unwrap_or_default();
        stats.record_match(score, self.outcome_for(participant_id));
        ctx.users.update_stats(&stats).await
    }
}

#[async_trait]
impl EventHandler for MatchEndedEventHandler {
    #[instrument(skip_all, fields(
        event_kind = "ended",
        match_id = %self.result.match_id,
        winner_id = ?self.result.winner_id,
        is_tie = self.result.is_tie,
    ))]
    async fn handle(
        &self,
        ctx: &EventHandlerContext,
        _event: &GameEvent,
    ) -> Result<(), ApplicationError> {
        info!("Executing match ended event");

        // Later snapshots for this match must not recreate the live entry.
        ctx.fence.seal(self.result.match_id).await;

        let mut failures = 0usize;

        for participant_id in [&self.result.participant_a, &self.result.participant_b] {
            if let Err(e) = self.update_stats(ctx, participant_id).await {
                warn!(participant_id = %participant_id, "Unable to update stats: {}", e);
                failures += 1;
            }
        }

        if let (Some(winner_id), Some(score)) = (&self.result.winner_id, self.result.winner_score) {
            for leaderboard_id in &ctx.config.match_leaderboards {
                match ctx.leaderboards.add_score(leaderboard_id, winner_id, score).await {
                    Ok(entry) => info!(
                        leaderboard_id = %leaderboard_id,
                        rank = entry.rank,
                        "Winner score submitted"
                    ),
                    Err(e) => {
                        warn!(leaderboard_id = %leaderboard_id, "Unable to submit winner score: {}", e);
                        failures += 1;
                    }
                }
            }
        }

        if let Err(e) = ctx.cache.delete(&keys::live_match(self.result.match_id)).await {
            warn!("Unable to delete live match snapshot: {}", e);
            failures += 1;
        }

        if failures > 0 {
            return Err(ApplicationError::Infrastructure(format!(
                "{failures} side effects failed for match {}",
                self.result.match_id
            )));
        }
        Ok(())
    }
}
