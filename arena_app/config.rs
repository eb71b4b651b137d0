use dotenvy::dotenv;
use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct Config {
    /// Number of event worker slots.
    pub event_workers: usize,
    /// Capacity of the pending event queue.
    pub event_queue_size: usize,
    pub leaderboard_cache_ttl: Duration,
    /// TTL of the in-progress match snapshot.
    pub match_cache_ttl: Duration,
    /// Pending notifications kept per subscriber before dropping.
    pub subscriber_buffer: usize,
    /// Leaderboards receiving the winner's score when a match ends.
    pub match_leaderboards: Vec<String>,
    pub default_max_entries: usize,
    /// How long an ended match keeps rejecting late snapshots.
    pub fence_retention: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_workers: 4,
            event_queue_size: 256,
            leaderboard_cache_ttl: Duration::from_secs(300),
            match_cache_ttl: Duration::from_secs(1800),
            subscriber_buffer: 100,
            match_leaderboards: vec!["global".to_string()],
            default_max_entries: 1000,
            fence_retention: Duration::from_secs(3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let event_workers = match env::var("ARENA_EVENT_WORKERS") {
            Ok(val) => val.parse::<usize>().unwrap_or(defaults.event_workers).max(1),
            Err(_) => defaults.event_workers,
        };

        let event_queue_size = match env::var("ARENA_EVENT_QUEUE_SIZE") {
            Ok(val) => val
                .parse::<usize>()
                .unwrap_or(defaults.event_queue_size)
                .max(1),
            Err(_) => defaults.event_queue_size,
        };

        let leaderboard_cache_ttl =
            secs_from_env("ARENA_LEADERBOARD_CACHE_TTL_SECS", defaults.leaderboard_cache_ttl);
        let match_cache_ttl = secs_from_env("ARENA_MATCH_CACHE_TTL_SECS", defaults.match_cache_ttl);
        let fence_retention =
            secs_from_env("ARENA_FENCE_RETENTION_SECS", defaults.fence_retention);

        let subscriber_buffer = match env::var("ARENA_SUBSCRIBER_BUFFER") {
            Ok(val) => val
                .parse::<usize>()
                .unwrap_or(defaults.subscriber_buffer)
                .max(1),
            Err(_) => defaults.subscriber_buffer,
        };

        let match_leaderboards = match env::var("ARENA_MATCH_LEADERBOARDS") {
            Ok(val) => parse_list(&val),
            Err(_) => defaults.match_leaderboards,
        };

        let default_max_entries = match env::var("ARENA_DEFAULT_MAX_ENTRIES") {
            Ok(val) => val
                .parse::<usize>()
                .unwrap_or(defaults.default_max_entries),
            Err(_) => defaults.default_max_entries,
        };

        Self {
            event_workers,
            event_queue_size,
            leaderboard_cache_ttl,
            match_cache_ttl,
            subscriber_buffer,
            match_leaderboards,
            default_max_entries,
            fence_retention,
        }
    }
}

fn secs_from_env(key: &str, default: Duration) -> Duration {
    match env::var(key) {
        Ok(val) => val.parse::<u64>().map(Duration::from_secs).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
