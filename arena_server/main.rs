use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{error, info};

use arena_app::{
    config::Config,
    event_registry::AppEventRegistry,
    events::{EventHandlerContext, EventProcessor, MatchFence, UserLocks},
    game_registry::GameRegistry,
    leaderboard_service::LeaderboardService,
};
use arena_db::{
    InMemoryCacheStore, InMemoryLeaderboardRepository, InMemoryMatchRepository,
    InMemoryUserRepository, MemoryStore,
};
use arena_types::{errors::ApplicationError, leaderboard::LeaderboardKind};

mod logs;
use logs::setup_logging;

const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

struct Arena {
    games: Arc<GameRegistry>,
    processor: Arc<EventProcessor>,
    cache: InMemoryCacheStore,
}

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn main() -> Result<(), ApplicationError> {
    let _log_guard = setup_logging();
    let arena = setup_app().await?;

    arena.processor.start().await;
    let purge = spawn_cache_purge(arena.cache.clone());
    info!("Arena ready, press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ApplicationError::Infrastructure(e.to_string()))?;

    info!(
        active_matches = arena.games.active_count().await,
        "Shutting down"
    );
    purge.abort();
    arena.processor.stop().await;
    Ok(())
}

async fn setup_app() -> Result<Arena, ApplicationError> {
    let config = Arc::new(Config::from_env());
    let store = MemoryStore::new();
    let cache = InMemoryCacheStore::new();

    let users = Arc::new(InMemoryUserRepository::new(store.clone()));
    let leaderboards = Arc::new(LeaderboardService::new(
        config.clone(),
        users.clone(),
        Arc::new(InMemoryLeaderboardRepository::new(store.clone())),
        Arc::new(cache.clone()),
    ));
    setup_match_leaderboards(&leaderboards, &config).await?;

    let context = Arc::new(EventHandlerContext {
        config: config.clone(),
        users,
        cache: Arc::new(cache.clone()),
        leaderboards,
        fence: Arc::new(MatchFence::new(config.fence_retention)),
        user_locks: Arc::new(UserLocks::new()),
    });
    let processor = Arc::new(EventProcessor::new(
        &config,
        Arc::new(AppEventRegistry::new()),
        context,
    ));
    let games = Arc::new(GameRegistry::new(
        Arc::new(InMemoryMatchRepository::new(store)),
        processor.sender(),
    ));

    Ok(Arena {
        games,
        processor,
        cache,
    })
}

/// Makes sure every leaderboard fed by finished matches exists.
async fn setup_match_leaderboards(
    leaderboards: &LeaderboardService,
    config: &Config,
) -> Result<(), ApplicationError> {
    for id in &config.match_leaderboards {
        match leaderboards.load_leaderboard(id).await {
            Ok(()) => info!(leaderboard_id = %id, "Leaderboard loaded"),
            Err(e) if e.is_not_found() => {
                leaderboards
                    .create_leaderboard(id, id, LeaderboardKind::Global, config.default_max_entries)
                    .await?;
            }
            Err(e) => {
                error!(leaderboard_id = %id, "Unable to load leaderboard: {e}");
                return Err(e);
            }
        }
    }
    Ok(())
}

fn spawn_cache_purge(cache: InMemoryCacheStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            cache.purge_expired().await;
        }
    })
}
