use uuid::Uuid;

use arena_game::models::Match;
use arena_types::errors::ApplicationError;

#[async_trait::async_trait]
pub trait MatchRepository: Send + Sync {
    /// Saves a match (creates if new, updates if exists).
    async fn save(&self, game: &Match) -> Result<(), ApplicationError>;

    /// Returns a match by id.
    async fn get_by_id(&self, match_id: Uuid) -> Result<Match, ApplicationError>;
}
