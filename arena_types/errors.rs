use thiserror::Error;

pub mod app_error;
pub mod db_error;
pub mod game_error;

pub use app_error::AppError;
pub use db_error::DbError;
pub use game_error::GameError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

/// Coarse classification of errors, the one callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidParticipant,
    InvalidTransition,
    AlreadyFinished,
    InvalidScore,
    Full,
    EventQueueFull,
    CacheMiss,
    Unavailable,
    Internal,
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Game(e) => match e {
                GameError::InvalidParticipant(_) => ErrorKind::InvalidParticipant,
                GameError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                GameError::AlreadyFinished(_) => ErrorKind::AlreadyFinished,
                GameError::InvalidScore(_) => ErrorKind::InvalidScore,
                GameError::LeaderboardFull { .. } => ErrorKind::Full,
                GameError::EntryNotFound { .. } => ErrorKind::NotFound,
            },
            ApplicationError::App(e) => match e {
                AppError::EventQueueFull => ErrorKind::EventQueueFull,
                AppError::EventProcessorStopped => ErrorKind::Unavailable,
                AppError::CacheMiss(_) => ErrorKind::CacheMiss,
                AppError::MatchNotFound(_) | AppError::LeaderboardNotFound(_) => {
                    ErrorKind::NotFound
                }
                AppError::NoEventHandler(_)
                | AppError::LeaderboardAlreadyExists(_)
                | AppError::Cache(_) => ErrorKind::Internal,
            },
            ApplicationError::Db(e) => match e {
                DbError::Json(_) | DbError::InvalidRecord(_) => ErrorKind::Internal,
                _ => ErrorKind::NotFound,
            },
            ApplicationError::Json(_) | ApplicationError::Infrastructure(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_cache_miss(&self) -> bool {
        self.kind() == ErrorKind::CacheMiss
    }
}
