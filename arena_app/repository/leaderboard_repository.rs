use arena_game::models::Leaderboard;
use arena_types::{errors::ApplicationError, leaderboard::LeaderboardEntry};

#[async_trait::async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Saves a leaderboard with all of its entries.
    async fn save(&self, leaderboard: &Leaderboard) -> Result<(), ApplicationError>;

    /// Returns a leaderboard by id.
    async fn get_by_id(&self, leaderboard_id: &str) -> Result<Leaderboard, ApplicationError>;

    /// Returns the best `limit` stored entries.
    async fn top_entries(
        &self,
        leaderboard_id: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, ApplicationError>;

    /// Returns the stored rank of a user.
    async fn user_rank(&self, leaderboard_id: &str, user_id: &str)
    -> Result<u32, ApplicationError>;
}
