use arena_app::repository::UserRepository;
use arena_types::{
    common::{User, UserStats},
    errors::{ApplicationError, DbError},
};

use crate::{models as db_models, store::MemoryStore};

#[derive(Clone)]
pub struct InMemoryUserRepository {
    store: MemoryStore,
}

impl InMemoryUserRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: &User) -> Result<(), ApplicationError> {
        let mut tables = self.store.write().await;
        tables
            .users
            .insert(user.id.clone(), db_models::User::from(user));
        Ok(())
    }

    async fn get_by_id(&self, user_id: &str) -> Result<User, ApplicationError> {
        let tables = self.store.read().await;
        let row = tables
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ApplicationError::Db(DbError::UserNotFound(user_id.to_string())))?;

        Ok(row.into())
    }

    async fn get_stats(&self, user_id: &str) -> Result<UserStats, ApplicationError> {
        let tables = self.store.read().await;
        let row = tables.user_stats.get(user_id).cloned().ok_or_else(|| {
            ApplicationError::Db(DbError::UserStatsNotFound(user_id.to_string()))
        })?;

        Ok(row.into())
    }

    async fn update_stats(&self, stats: &UserStats) -> Result<(), ApplicationError> {
        let mut tables = self.store.write().await;
        if !tables.users.contains_key(&stats.user_id) {
            return Err(ApplicationError::Db(DbError::UserNotFound(
                stats.user_id.clone(),
            )));
        }

        tables
            .user_stats
            .insert(stats.user_id.clone(), db_models::UserStats::from(stats));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_types::common::MatchOutcome;

    #[tokio::test]
    async fn test_user_round_trip() {
        let repo = InMemoryUserRepository::new(MemoryStore::new());
        let user = User::new("p1", "Player One");
        repo.save(&user).await.unwrap();

        assert_eq!(repo.get_by_id("p1").await.unwrap(), user);
        assert!(repo.get_by_id("p2").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_stats_are_stored_per_user() {
        let repo = InMemoryUserRepository::new(MemoryStore::new());
        repo.save(&User::new("p1", "Player One")).await.unwrap();
        assert!(repo.get_stats("p1").await.unwrap_err().is_not_found());

        let mut stats = UserStats::new("p1");
        stats.record_match(12, MatchOutcome::Win);
        repo.update_stats(&stats).await.unwrap();

        let stored = repo.get_stats("p1").await.unwrap();
        assert_eq!(stored.total_games, 1);
        assert_eq!(stored.wins, 1);
        assert_eq!(stored.average_score, 12.0);
    }

    #[tokio::test]
    async fn test_stats_for_unknown_user_are_rejected() {
        let repo = InMemoryUserRepository::new(MemoryStore::new());
        let err = repo.update_stats(&UserStats::new("ghost")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Db(DbError::UserNotFound(_))));
    }
}
