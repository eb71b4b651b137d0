mod leaderboard_repository;
mod match_repository;
mod user_repository;

pub use leaderboard_repository::InMemoryLeaderboardRepository;
pub use match_repository::InMemoryMatchRepository;
pub use user_repository::InMemoryUserRepository;
