use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::models as db_models;

#[derive(Default)]
pub(crate) struct Tables {
    pub users: HashMap<String, db_models::User>,
    pub user_stats: HashMap<String, db_models::UserStats>,
    pub matches: HashMap<Uuid, db_models::Match>,
    pub leaderboards: HashMap<String, db_models::Leaderboard>,
    pub leaderboard_entries: HashMap<String, Vec<db_models::LeaderboardEntry>>,
}

/// Process-local storage shared by the in-memory repositories.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}
