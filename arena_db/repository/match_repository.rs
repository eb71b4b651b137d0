use uuid::Uuid;

use arena_app::repository::MatchRepository;
use arena_game::models::Match;
use arena_types::errors::{ApplicationError, DbError};

use crate::{models as db_models, store::MemoryStore};

#[derive(Clone)]
pub struct InMemoryMatchRepository {
    store: MemoryStore,
}

impl InMemoryMatchRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn save(&self, game: &Match) -> Result<(), ApplicationError> {
        let mut tables = self.store.write().await;
        tables.matches.insert(game.id, db_models::Match::from(game));
        Ok(())
    }

    async fn get_by_id(&self, match_id: Uuid) -> Result<Match, ApplicationError> {
        let tables = self.store.read().await;
        let row = tables
            .matches
            .get(&match_id)
            .cloned()
            .ok_or_else(|| ApplicationError::Db(DbError::MatchNotFound(match_id)))?;

        Ok(row.try_into()?)
    }
}
