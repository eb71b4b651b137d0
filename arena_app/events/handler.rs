use async_trait::async_trait;
use std::sync::Arc;

use arena_types::errors::ApplicationError;

use crate::{
    cache::CacheStore,
    config::Config,
    events::{GameEvent, MatchFence, UserLocks},
    leaderboard_service::LeaderboardService,
    repository::UserRepository,
};

/// Context which contains EventHandler dependencies.
pub struct EventHandlerContext {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub cache: Arc<dyn CacheStore>,
    pub leaderboards: Arc<LeaderboardService>,
    pub fence: Arc<MatchFence>,
    pub user_locks: Arc<UserLocks>,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &EventHandlerContext,
        event: &GameEvent,
    ) -> Result<(), ApplicationError>;
}

/// Maps an event to the handler responsible for its side effects.
pub trait EventRegistry: Send + Sync {
    fn get_handler(&self, event: &GameEvent) -> Result<Box<dyn EventHandler>, ApplicationError>;
}
