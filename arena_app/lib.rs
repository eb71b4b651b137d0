pub mod cache;
pub mod config;
pub mod event_handlers;
pub mod event_registry;
pub mod events;
pub mod game_registry;
pub mod leaderboard_service;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
