mod leaderboard_repository;
mod match_repository;
mod user_repository;

pub use leaderboard_repository::LeaderboardRepository;
pub use match_repository::MatchRepository;
pub use user_repository::UserRepository;
