#[cfg(any(test, feature = "test-utils"))]
#[cfg(not(tarpaulin_include))]
pub mod tests {
    use async_trait::async_trait;
    use serde_json::Value;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };
    use uuid::Uuid;

    use arena_game::models::{Leaderboard, Match};
    use arena_types::{
        common::{User, UserStats},
        errors::{AppError, ApplicationError, DbError},
        leaderboard::LeaderboardEntry,
    };

    use crate::{
        cache::CacheStore,
        config::Config,
        events::{
            EventHandler, EventHandlerContext, EventRegistry, GameEvent, MatchFence, UserLocks,
        },
        leaderboard_service::LeaderboardService,
        repository::{LeaderboardRepository, MatchRepository, UserRepository},
    };

    #[derive(Default, Clone)]
    pub struct MockUserRepository {
        users: Arc<Mutex<HashMap<String, User>>>,
        stats: Arc<Mutex<HashMap<String, UserStats>>>,
        fail_stats: Arc<Mutex<bool>>,
        stats_read_delay: Arc<Mutex<Option<Duration>>>,
    }

    impl MockUserRepository {
        pub fn add_user(&self, user_id: &str, display_name: &str) {
            self.users
                .lock()
                .unwrap()
                .insert(user_id.to_string(), User::new(user_id, display_name));
        }

        pub fn stats(&self, user_id: &str) -> Option<UserStats> {
            self.stats.lock().unwrap().get(user_id).cloned()
        }

        /// Makes every `get_stats` call yield for `delay` before reading.
        pub fn delay_stats_reads(&self, delay: Duration) {
            *self.stats_read_delay.lock().unwrap() = Some(delay);
        }

        /// Makes `update_stats` fail until switched off.
        pub fn fail_stats_updates(&self, fail: bool) {
            *self.fail_stats.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn save(&self, user: &User) -> Result<(), ApplicationError> {
            self.users
                .lock()
                .unwrap()
                .insert(user.id.clone(), user.clone());
            Ok(())
        }

        async fn get_by_id(&self, user_id: &str) -> Result<User, ApplicationError> {
            self.users
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .ok_or_else(|| ApplicationError::Db(DbError::UserNotFound(user_id.to_string())))
        }

        async fn get_stats(&self, user_id: &str) -> Result<UserStats, ApplicationError> {
            let delay = *self.stats_read_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.stats
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .ok_or_else(|| {
                    ApplicationError::Db(DbError::UserStatsNotFound(user_id.to_string()))
                })
        }

        async fn update_stats(&self, stats: &UserStats) -> Result<(), ApplicationError> {
            if *self.fail_stats.lock().unwrap() {
                return Err(ApplicationError::Infrastructure(
                    "stats store unavailable".into(),
                ));
            }
            self.stats
                .lock()
                .unwrap()
                .insert(stats.user_id.clone(), stats.clone());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct MockMatchRepository {
        matches: Arc<Mutex<HashMap<Uuid, Match>>>,
        fail_saves: Arc<Mutex<bool>>,
    }

    impl MockMatchRepository {
        pub fn get(&self, match_id: Uuid) -> Option<Match> {
            self.matches.lock().unwrap().get(&match_id).cloned()
        }

        pub fn fail_saves(&self, fail: bool) {
            *self.fail_saves.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl MatchRepository for MockMatchRepository {
        async fn save(&self, game: &Match) -> Result<(), ApplicationError> {
            if *self.fail_saves.lock().unwrap() {
                return Err(ApplicationError::Infrastructure("match store unavailable".into()));
            }
            self.matches.lock().unwrap().insert(game.id, game.clone());
            Ok(())
        }

        async fn get_by_id(&self, match_id: Uuid) -> Result<Match, ApplicationError> {
            self.get(match_id)
                .ok_or_else(|| ApplicationError::Db(DbError::MatchNotFound(match_id)))
        }
    }

    #[derive(Default, Clone)]
    pub struct MockLeaderboardRepository {
        boards: Arc<Mutex<HashMap<String, Leaderboard>>>,
        fail_saves: Arc<Mutex<bool>>,
    }

    impl MockLeaderboardRepository {
        pub fn get(&self, leaderboard_id: &str) -> Option<Leaderboard> {
            self.boards.lock().unwrap().get(leaderboard_id).cloned()
        }

        pub fn insert(&self, board: Leaderboard) {
            self.boards.lock().unwrap().insert(board.id.clone(), board);
        }

        pub fn fail_saves(&self, fail: bool) {
            *self.fail_saves.lock().unwrap() = fail;
        }

        fn stored(&self, leaderboard_id: &str) -> Result<Leaderboard, ApplicationError> {
            self.get(leaderboard_id).ok_or_else(|| {
                ApplicationError::Db(DbError::LeaderboardNotFound(leaderboard_id.to_string()))
            })
        }
    }

    #[async_trait]
    impl LeaderboardRepository for MockLeaderboardRepository {
        async fn save(&self, leaderboard: &Leaderboard) -> Result<(), ApplicationError> {
            if *self.fail_saves.lock().unwrap() {
                return Err(ApplicationError::Infrastructure(
                    "leaderboard store unavailable".into(),
                ));
            }
            self.insert(leaderboard.clone());
            Ok(())
        }

        async fn get_by_id(&self, leaderboard_id: &str) -> Result<Leaderboard, ApplicationError> {
            self.stored(leaderboard_id)
        }

        async fn top_entries(
            &self,
            leaderboard_id: &str,
            limit: usize,
        ) -> Result<Vec<LeaderboardEntry>, ApplicationError> {
            Ok(self.stored(leaderboard_id)?.top_entries(limit))
        }

        async fn user_rank(
            &self,
            leaderboard_id: &str,
            user_id: &str,
        ) -> Result<u32, ApplicationError> {
            Ok(self.stored(leaderboard_id)?.user_rank(user_id)?)
        }
    }

    /// Cache without expiry that counts writes and can be switched to fail.
    #[derive(Default, Clone)]
    pub struct MockCacheStore {
        values: Arc<Mutex<HashMap<String, Value>>>,
        set_calls: Arc<Mutex<usize>>,
        fail: Arc<Mutex<bool>>,
    }

    impl MockCacheStore {
        pub fn contains(&self, key: &str) -> bool {
            self.values.lock().unwrap().contains_key(key)
        }

        pub fn set_calls(&self) -> usize {
            *self.set_calls.lock().unwrap()
        }

        pub fn fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn check(&self) -> Result<(), ApplicationError> {
            if *self.fail.lock().unwrap() {
                return Err(AppError::Cache("cache unavailable".into()).into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for MockCacheStore {
        async fn set(&self, key: &str, value: Value, _ttl: Duration) -> Result<(), ApplicationError> {
            self.check()?;
            *self.set_calls.lock().unwrap() += 1;
            self.values.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Value, ApplicationError> {
            self.check()?;
            self.values
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::CacheMiss(key.to_string()).into())
        }

        async fn delete(&self, key: &str) -> Result<(), ApplicationError> {
            self.check()?;
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Registry whose handlers only record the events they receive.
    #[derive(Default, Clone)]
    pub struct TestRegistry {
        handled: Arc<Mutex<Vec<GameEvent>>>,
    }

    impl TestRegistry {
        pub fn handled(&self) -> Vec<GameEvent> {
            self.handled.lock().unwrap().clone()
        }
    }

    struct RecordingHandler {
        handled: Arc<Mutex<Vec<GameEvent>>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(
            &self,
            _ctx: &EventHandlerContext,
            event: &GameEvent,
        ) -> Result<(), ApplicationError> {
            self.handled.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    impl EventRegistry for TestRegistry {
        fn get_handler(
            &self,
            _event: &GameEvent,
        ) -> Result<Box<dyn EventHandler>, ApplicationError> {
            Ok(Box::new(RecordingHandler {
                handled: self.handled.clone(),
            }))
        }
    }

    /// Mock collaborators wired into a service and a handler context.
    pub struct TestHarness {
        pub config: Arc<Config>,
        pub users: Arc<MockUserRepository>,
        pub matches: Arc<MockMatchRepository>,
        pub leaderboard_repo: Arc<MockLeaderboardRepository>,
        pub cache: Arc<MockCacheStore>,
        pub leaderboards: Arc<LeaderboardService>,
        pub context: Arc<EventHandlerContext>,
    }

    impl TestHarness {
        pub fn new(config: Config) -> Self {
            let config = Arc::new(config);
            let users = Arc::new(MockUserRepository::default());
            let matches = Arc::new(MockMatchRepository::default());
            let leaderboard_repo = Arc::new(MockLeaderboardRepository::default());
            let cache = Arc::new(MockCacheStore::default());

            let leaderboards = Arc::new(LeaderboardService::new(
                config.clone(),
                users.clone(),
                leaderboard_repo.clone(),
                cache.clone(),
            ));
            let context = Arc::new(EventHandlerContext {
                config: config.clone(),
                users: users.clone(),
                cache: cache.clone(),
                leaderboards: leaderboards.clone(),
                fence: Arc::new(MatchFence::new(config.fence_retention)),
                user_locks: Arc::new(UserLocks::new()),
            });

            Self {
                config,
                users,
                matches,
                leaderboard_repo,
                cache,
                leaderboards,
                context,
            }
        }
    }

    impl Default for TestHarness {
        fn default() -> Self {
            Self::new(Config::default())
        }
    }
}
