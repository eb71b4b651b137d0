use arena_app::repository::LeaderboardRepository;
use arena_game::models::Leaderboard;
use arena_types::{
    errors::{ApplicationError, DbError},
    leaderboard::LeaderboardEntry,
};

use crate::{mapping::LeaderboardAggregate, store::MemoryStore};

/// Stores the board row and its entry rows separately; saving replaces
/// every entry row of the board.
#[derive(Clone)]
pub struct InMemoryLeaderboardRepository {
    store: MemoryStore,
}

impl InMemoryLeaderboardRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn not_found(leaderboard_id: &str) -> ApplicationError {
    ApplicationError::Db(DbError::LeaderboardNotFound(leaderboard_id.to_string()))
}

#[async_trait::async_trait]
impl LeaderboardRepository for InMemoryLeaderboardRepository {
    async fn save(&self, leaderboard: &Leaderboard) -> Result<(), ApplicationError> {
        let agg = LeaderboardAggregate::from(leaderboard);
        let mut tables = self.store.write().await;
        tables
            .leaderboard_entries
            .insert(leaderboard.id.clone(), agg.entries);
        tables
            .leaderboards
            .insert(leaderboard.id.clone(), agg.leaderboard);
        Ok(())
    }

    async fn get_by_id(&self, leaderboard_id: &str) -> Result<Leaderboard, ApplicationError> {
        let tables = self.store.read().await;
        let leaderboard = tables
            .leaderboards
            .get(leaderboard_id)
            .cloned()
            .ok_or_else(|| not_found(leaderboard_id))?;
        let entries = tables
            .leaderboard_entries
            .get(leaderboard_id)
            .cloned()
            .unwrap_or_default();

        Ok(LeaderboardAggregate {
            leaderboard,
            entries,
        }
        .try_into()?)
    }

    async fn top_entries(
        &self,
        leaderboard_id: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, ApplicationError> {
        let tables = self.store.read().await;
        if !tables.leaderboards.contains_key(leaderboard_id) {
            return Err(not_found(leaderboard_id));
        }

        let mut rows = tables
            .leaderboard_entries
            .get(leaderboard_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|r| r.rank);

        Ok(rows.into_iter().take(limit).map(Into::into).collect())
    }

    async fn user_rank(&self, leaderboard_id: &str, user_id: &str) -> Result<u32, ApplicationError> {
        let tables = self.store.read().await;
        let rows = tables
            .leaderboard_entries
            .get(leaderboard_id)
            .ok_or_else(|| not_found(leaderboard_id))?;

        rows.iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.rank.max(0) as u32)
            .ok_or_else(|| {
                ApplicationError::Db(DbError::UserNotFound(user_id.to_string()))
            })
    }
}
