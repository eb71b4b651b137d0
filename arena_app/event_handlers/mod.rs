pub mod helpers;
pub mod match_ended;
pub mod match_started;
pub mod score_updated;

pub use match_ended::MatchEndedEventHandler;
pub use match_started::MatchStartedEventHandler;
pub use score_updated::ScoreUpdatedEventHandler;
