pub mod game_match;
pub mod leaderboard;

pub use game_match::Match;
pub use leaderboard::Leaderboard;
