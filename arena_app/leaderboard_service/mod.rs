mod projections;
mod subscriptions;

pub use projections::ProjectionCache;
pub use subscriptions::{LeaderboardUpdate, Subscribers, Subscription, UpdateKind};

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use arena_game::models::Leaderboard;
use arena_types::{
    errors::{AppError, ApplicationError, GameError},
    leaderboard::{LeaderboardEntry, LeaderboardKind, LeaderboardStats},
};

use crate::{
    cache::{CacheStore, keys},
    config::Config,
    repository::{LeaderboardRepository, UserRepository},
};

/// In-memory board with its cached views and subscribers.
struct BoardHandle {
    board: RwLock<Leaderboard>,
    projections: ProjectionCache,
    subscribers: Subscribers,
}

impl BoardHandle {
    /// Serves a projection from the cache, computing and caching it on a miss.
    async fn read_through<T, F>(&self, key: String, project: F) -> Result<T, ApplicationError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&Leaderboard) -> Result<T, ApplicationError>,
    {
        if let Some(value) = self.projections.read(&key).await {
            return Ok(value);
        }

        let generation = self.projections.generation().await;
        let value = {
            let board = self.board.read().await;
            project(&board)?
        };
        self.projections.populate(&key, &value, generation).await;
        Ok(value)
    }
}

/// Owns every loaded leaderboard. Mutations persist the board, invalidate
/// its cached views and notify its subscribers.
pub struct LeaderboardService {
    config: Arc<Config>,
    users: Arc<dyn UserRepository>,
    repository: Arc<dyn LeaderboardRepository>,
    cache: Arc<dyn CacheStore>,
    boards: RwLock<HashMap<String, Arc<BoardHandle>>>,
}

impl LeaderboardService {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserRepository>,
        repository: Arc<dyn LeaderboardRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            config,
            users,
            repository,
            cache,
            boards: RwLock::new(HashMap::new()),
        }
    }

    fn board_handle(&self, board: Leaderboard) -> Arc<BoardHandle> {
        Arc::new(BoardHandle {
            board: RwLock::new(board),
            projections: ProjectionCache::new(
                self.cache.clone(),
                self.config.leaderboard_cache_ttl,
            ),
            subscribers: Subscribers::new(self.config.subscriber_buffer),
        })
    }

    async fn handle(&self, leaderboard_id: &str) -> Result<Arc<BoardHandle>, ApplicationError> {
        self.boards
            .read()
            .await
            .get(leaderboard_id)
            .cloned()
            .ok_or_else(|| AppError::LeaderboardNotFound(leaderboard_id.to_string()).into())
    }

    #[instrument(skip_all, fields(leaderboard_id = %id))]
    pub async fn create_leaderboard(
        &self,
        id: &str,
        name: &str,
        kind: LeaderboardKind,
        max_entries: usize,
    ) -> Result<Leaderboard, ApplicationError> {
        let mut boards = self.boards.write().await;
        if boards.contains_key(id) {
            return Err(AppError::LeaderboardAlreadyExists(id.to_string()).into());
        }

        let board = Leaderboard::new(id, name, kind, max_entries);
        self.repository.save(&board).await?;
        boards.insert(id.to_string(), self.board_handle(board.clone()));

        info!(max_entries, "Leaderboard created");
        Ok(board)
    }

    /// Registers a stored board. Boards already in memory are left as they are.
    #[instrument(skip_all, fields(leaderboard_id = %id))]
    pub async fn load_leaderboard(&self, id: &str) -> Result<(), ApplicationError> {
        if self.boards.read().await.contains_key(id) {
            return Ok(());
        }

        let board = self.repository.get_by_id(id).await?;
        let entries = board.len();
        self.boards
            .write()
            .await
            .entry(id.to_string())
            .or_insert_with(|| self.board_handle(board));

        info!(entries, "Leaderboard loaded");
        Ok(())
    }

    pub async fn leaderboard_ids(&self) -> Vec<String> {
        self.boards.read().await.keys().cloned().collect()
    }

    /// Submits a score for a user, replacing any previous one.
    #[instrument(skip_all, fields(leaderboard_id = %leaderboard_id, user_id = %user_id, score = score))]
    pub async fn add_score(
        &self,
        leaderboard_id: &str,
        user_id: &str,
        score: i64,
    ) -> Result<LeaderboardEntry, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        if score < 0 {
            return Err(GameError::InvalidScore(score).into());
        }
        let user = self.users.get_by_id(user_id).await?;

        let (entry, old_rank) = {
            let mut board = handle.board.write().await;
            let old_rank = board.entry(user_id).map(|e| e.rank);

            let mut next = board.clone();
            let entry = next.add_entry(user_id, &user.display_name, score)?;
            self.repository.save(&next).await?;
            *board = next;
            (entry, old_rank)
        };

        handle.projections.invalidate().await;
        self.publish(
            leaderboard_id,
            &handle,
            UpdateKind::ScoreUpdated {
                user_id: user_id.to_string(),
                display_name: entry.display_name.clone(),
                score,
                old_rank,
                new_rank: entry.rank,
            },
        )
        .await;

        debug!(old_rank = ?old_rank, new_rank = entry.rank, "Score added");
        Ok(entry)
    }

    #[instrument(skip_all, fields(leaderboard_id = %leaderboard_id, user_id = %user_id))]
    pub async fn remove_user(
        &self,
        leaderboard_id: &str,
        user_id: &str,
    ) -> Result<LeaderboardEntry, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;

        let removed = {
            let mut board = handle.board.write().await;
            let mut next = board.clone();
            let removed = next.remove_user(user_id)?;
            self.repository.save(&next).await?;
            *board = next;
            removed
        };

        handle.projections.invalidate().await;
        self.publish(
            leaderboard_id,
            &handle,
            UpdateKind::UserRemoved {
                user_id: user_id.to_string(),
                old_rank: removed.rank,
            },
        )
        .await;

        info!(old_rank = removed.rank, "User removed from leaderboard");
        Ok(removed)
    }

    pub async fn get_leaderboard(&self, leaderboard_id: &str) -> Result<Leaderboard, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        handle
            .read_through(keys::leaderboard(leaderboard_id), |board| Ok(board.clone()))
            .await
    }

    pub async fn get_top_entries(
        &self,
        leaderboard_id: &str,
        count: usize,
    ) -> Result<Vec<LeaderboardEntry>, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        handle
            .read_through(keys::top_entries(leaderboard_id, count), |board| {
                Ok(board.top_entries(count))
            })
            .await
    }

    pub async fn get_user_rank(
        &self,
        leaderboard_id: &str,
        user_id: &str,
    ) -> Result<u32, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        handle
            .read_through(keys::user_rank(leaderboard_id, user_id), |board| {
                Ok(board.user_rank(user_id)?)
            })
            .await
    }

    pub async fn get_stats(&self, leaderboard_id: &str) -> Result<LeaderboardStats, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        handle
            .read_through(keys::stats(leaderboard_id), |board| Ok(board.stats()))
            .await
    }

    pub async fn subscribe(&self, leaderboard_id: &str) -> Result<Subscription, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        let subscription = handle.subscribers.subscribe().await;
        debug!(leaderboard_id, subscriber_id = %subscription.id, "Subscribed");
        Ok(subscription)
    }

    /// Returns whether the subscription existed.
    pub async fn unsubscribe(
        &self,
        leaderboard_id: &str,
        subscription_id: Uuid,
    ) -> Result<bool, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        Ok(handle.subscribers.unsubscribe(subscription_id).await)
    }

    /// Rebuilds the cached full board and pushes it to subscribers.
    #[instrument(skip_all, fields(leaderboard_id = %leaderboard_id))]
    pub async fn refresh_leaderboard(&self, leaderboard_id: &str) -> Result<Leaderboard, ApplicationError> {
        let handle = self.handle(leaderboard_id).await?;
        handle.projections.invalidate().await;

        let board = handle
            .read_through(keys::leaderboard(leaderboard_id), |board| Ok(board.clone()))
            .await?;

        self.publish(
            leaderboard_id,
            &handle,
            UpdateKind::Refreshed {
                entries: board.entries().to_vec(),
            },
        )
        .await;

        info!(entries = board.len(), "Leaderboard refreshed");
        Ok(board)
    }

    async fn publish(&self, leaderboard_id: &str, handle: &BoardHandle, kind: UpdateKind) {
        let update = LeaderboardUpdate {
            leaderboard_id: leaderboard_id.to_string(),
            kind,
            timestamp: Utc::now(),
        };
        let delivered = handle.subscribers.publish(&update).await;
        debug!(delivered, "Leaderboard update published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use arena_types::errors::ErrorKind;

    use crate::test_utils::tests::TestHarness;

    async fn harness(max_entries: usize) -> TestHarness {
        let harness = TestHarness::default();
        for (id, name) in [("a", "Alice"), ("b", "Bob"), ("c", "Carol"), ("d", "Dave")] {
            harness.users.add_user(id, name);
        }
        harness
            .leaderboards
            .create_leaderboard("global", "Global", LeaderboardKind::Global, max_entries)
            .await
            .unwrap();
        harness
    }

    #[tokio::test]
    async fn test_create_leaderboard_rejects_duplicates() {
        let harness = harness(10).await;
        let err = harness
            .leaderboards
            .create_leaderboard("global", "Again", LeaderboardKind::Weekly, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::App(AppError::LeaderboardAlreadyExists(_))
        ));
        assert!(harness.leaderboard_repo.get("global").is_some());
    }

    #[tokio::test]
    async fn test_unknown_leaderboard_is_not_found() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        assert_eq!(
            service.add_score("nope", "a", 1).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            service.get_top_entries("nope", 3).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(service.subscribe("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_add_score_ranks_and_persists() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();
        service.add_score("global", "b", 80).await.unwrap();
        let carol = service.add_score("global", "c", 65).await.unwrap();

        assert_eq!(carol.rank, 2);
        assert_eq!(carol.display_name, "Carol");

        let stored = harness.leaderboard_repo.get("global").unwrap();
        let order: Vec<_> = stored.entries().iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_add_score_validation() {
        let harness = harness(2).await;
        let service = &harness.leaderboards;

        assert_eq!(
            service.add_score("global", "a", -1).await.unwrap_err().kind(),
            ErrorKind::InvalidScore
        );
        assert_eq!(
            service.add_score("global", "ghost", 10).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        service.add_score("global", "a", 50).await.unwrap();
        service.add_score("global", "b", 80).await.unwrap();
        assert_eq!(
            service.add_score("global", "c", 40).await.unwrap_err().kind(),
            ErrorKind::Full
        );
        assert_eq!(service.get_stats("global").await.unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_repository_failure_keeps_board_unchanged() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();

        harness.leaderboard_repo.fail_saves(true);
        assert!(service.add_score("global", "b", 80).await.is_err());
        assert!(service.remove_user("global", "a").await.is_err());

        let board = service.get_leaderboard("global").await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board.entry("a").unwrap().score, 50);
    }

    #[tokio::test]
    async fn test_reads_are_served_from_cache() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();

        let first = service.get_top_entries("global", 3).await.unwrap();
        assert!(harness.cache.contains(&keys::top_entries("global", 3)));
        let writes = harness.cache.set_calls();

        let second = service.get_top_entries("global", 3).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(harness.cache.set_calls(), writes);
    }

    #[tokio::test]
    async fn test_mutations_invalidate_every_projection() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();

        // Query shapes beyond any fixed range must be invalidated too.
        service.get_top_entries("global", 3).await.unwrap();
        service.get_top_entries("global", 250).await.unwrap();
        service.get_user_rank("global", "a").await.unwrap();
        service.get_stats("global").await.unwrap();
        service.get_leaderboard("global").await.unwrap();

        service.add_score("global", "b", 80).await.unwrap();

        for key in [
            keys::top_entries("global", 3),
            keys::top_entries("global", 250),
            keys::user_rank("global", "a"),
            keys::stats("global"),
            keys::leaderboard("global"),
        ] {
            assert!(!harness.cache.contains(&key), "{key} should be invalidated");
        }

        assert_eq!(service.get_top_entries("global", 250).await.unwrap().len(), 2);
        assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 2);
        assert_eq!(service.get_stats("global").await.unwrap().max_score, 80);
    }

    #[tokio::test]
    async fn test_reads_match_the_board_after_mutations() {
        let harness = harness(3).await;
        let service = &harness.leaderboards;
        for (user, score) in [("a", 50), ("b", 80), ("c", 30), ("d", 60), ("a", 10)] {
            let _ = service.add_score("global", user, score).await;
            service.get_top_entries("global", 10).await.unwrap();

            let board = service.get_leaderboard("global").await.unwrap();
            let top = service.get_top_entries("global", 10).await.unwrap();
            assert_eq!(top, board.top_entries(10));
            for entry in board.entries() {
                assert_eq!(
                    service.get_user_rank("global", &entry.user_id).await.unwrap(),
                    entry.rank
                );
            }
        }
    }

    #[tokio::test]
    async fn test_cache_failures_fall_back_to_the_board() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();

        harness.cache.fail(true);
        assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 1);
        assert_eq!(service.get_stats("global").await.unwrap().count, 1);
        service.add_score("global", "b", 80).await.unwrap();
        assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rank_of_missing_user_is_not_cached() {
        let harness = harness(10).await;
        let err = harness
            .leaderboards
            .get_user_rank("global", "a")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!harness.cache.contains(&keys::user_rank("global", "a")));
    }

    #[tokio::test]
    async fn test_subscriber_receives_score_update() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "b", 80).await.unwrap();
        let mut subscription = service.subscribe("global").await.unwrap();

        service.add_score("global", "a", 50).await.unwrap();
        service.add_score("global", "a", 90).await.unwrap();

        let first = subscription.recv().await.unwrap();
        assert_eq!(first.leaderboard_id, "global");
        assert_eq!(
            first.kind,
            UpdateKind::ScoreUpdated {
                user_id: "a".into(),
                display_name: "Alice".into(),
                score: 50,
                old_rank: None,
                new_rank: 2,
            }
        );

        let second = subscription.recv().await.unwrap();
        assert!(matches!(
            second.kind,
            UpdateKind::ScoreUpdated {
                old_rank: Some(2),
                new_rank: 1,
                ..
            }
        ));
        assert!(subscription.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_subscriber_misses_updates() {
        let harness = TestHarness::new(Config {
            subscriber_buffer: 1,
            ..Config::default()
        });
        harness.users.add_user("a", "Alice");
        let service = &harness.leaderboards;
        service
            .create_leaderboard("global", "Global", LeaderboardKind::Global, 10)
            .await
            .unwrap();

        let mut slow = service.subscribe("global").await.unwrap();
        service.add_score("global", "a", 1).await.unwrap();
        // Buffer is full: this one is dropped and add_score is not held up.
        tokio::time::timeout(
            Duration::from_secs(1),
            service.add_score("global", "a", 2),
        )
        .await
        .unwrap()
        .unwrap();

        let received = slow.recv().await.unwrap();
        assert!(matches!(received.kind, UpdateKind::ScoreUpdated { score: 1, .. }));
        assert!(slow.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_the_stream() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        let mut subscription = service.subscribe("global").await.unwrap();

        assert!(service.unsubscribe("global", subscription.id).await.unwrap());
        assert!(!service.unsubscribe("global", subscription.id).await.unwrap());
        service.add_score("global", "a", 10).await.unwrap();
        assert!(subscription.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_remove_user_reranks_and_notifies() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();
        service.add_score("global", "b", 80).await.unwrap();
        service.get_user_rank("global", "a").await.unwrap();
        let mut subscription = service.subscribe("global").await.unwrap();

        let removed = service.remove_user("global", "b").await.unwrap();
        assert_eq!(removed.rank, 1);
        assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 1);

        let update = subscription.recv().await.unwrap();
        assert_eq!(
            update.kind,
            UpdateKind::UserRemoved {
                user_id: "b".into(),
                old_rank: 1,
            }
        );

        assert_eq!(
            service.remove_user("global", "b").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_refresh_repopulates_and_publishes() {
        let harness = harness(10).await;
        let service = &harness.leaderboards;
        service.add_score("global", "a", 50).await.unwrap();
        service.add_score("global", "b", 80).await.unwrap();
        let mut subscription = service.subscribe("global").await.unwrap();

        let board = service.refresh_leaderboard("global").await.unwrap();
        assert_eq!(board.len(), 2);
        assert!(harness.cache.contains(&keys::leaderboard("global")));

        match subscription.recv().await.unwrap().kind {
            UpdateKind::Refreshed { entries } => {
                assert_eq!(entries, board.entries().to_vec());
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_leaderboard_from_repository() {
        let harness = harness(10).await;
        let mut stored = Leaderboard::new("weekly", "Weekly", LeaderboardKind::Weekly, 5);
        stored.add_entry("a", "Alice", 40).unwrap();
        harness.leaderboard_repo.insert(stored);

        let service = &harness.leaderboards;
        service.load_leaderboard("weekly").await.unwrap();
        // Loading twice keeps the in-memory board.
        service.add_score("weekly", "b", 70).await.unwrap();
        service.load_leaderboard("weekly").await.unwrap();

        assert_eq!(service.get_user_rank("weekly", "a").await.unwrap(), 2);
        assert_eq!(
            service.load_leaderboard("missing").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let mut ids = service.leaderboard_ids().await;
        ids.sort();
        assert_eq!(ids, vec!["global".to_string(), "weekly".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_ranks_dense() {
        let harness = harness(50).await;
        for i in 0..40 {
            harness.users.add_user(&format!("u{i}"), &format!("User {i}"));
        }
        let service = harness.leaderboards.clone();

        let mut tasks = Vec::new();
        for i in 0..40 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                service
                    .add_score("global", &format!("u{i}"), (i * 7 % 23) as i64)
                    .await
                    .unwrap();
                service.get_top_entries("global", 10).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let board = service.get_leaderboard("global").await.unwrap();
        assert_eq!(board.len(), 40);
        for (i, entry) in board.entries().iter().enumerate() {
            assert_eq!(entry.rank as usize, i + 1);
        }
        assert_eq!(
            service.get_top_entries("global", 10).await.unwrap(),
            board.top_entries(10)
        );
    }
}
