use arena_types::{
    common::{User, UserStats},
    errors::ApplicationError,
};

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Saves a user (creates if new, updates if exists).
    async fn save(&self, user: &User) -> Result<(), ApplicationError>;

    /// Find user by id.
    async fn get_by_id(&self, user_id: &str) -> Result<User, ApplicationError>;

    /// Returns aggregate match statistics for a user.
    async fn get_stats(&self, user_id: &str) -> Result<UserStats, ApplicationError>;

    /// Stores aggregate match statistics for a user.
    async fn update_stats(&self, stats: &UserStats) -> Result<(), ApplicationError>;
}
