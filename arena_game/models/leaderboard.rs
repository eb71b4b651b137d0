use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use arena_types::{
    errors::GameError,
    leaderboard::{LeaderboardEntry, LeaderboardKind, LeaderboardStats},
};

/// Ranked, capacity-bound collection of scores.
///
/// Entries are always kept sorted by score (descending) with ranks `1..=len`.
/// Equal scores keep their current relative order: there is no secondary
/// sort key, so the entry that reached a score first stays ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub id: String,
    pub name: String,
    pub kind: LeaderboardKind,
    pub max_entries: usize,
    entries: Vec<LeaderboardEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Leaderboard {
    pub fn new(id: &str, name: &str, kind: LeaderboardKind, max_entries: usize) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            max_entries,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a board from stored entries. Stored ranks are ignored: entries
    /// are re-sorted, re-ranked and cut down to `max_entries`.
    pub fn from_entries(
        id: &str,
        name: &str,
        kind: LeaderboardKind,
        max_entries: usize,
        entries: Vec<LeaderboardEntry>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut board = Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            max_entries,
            entries,
            created_at,
            updated_at,
        };
        board.rerank(updated_at);
        board.entries.truncate(max_entries);
        board
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn entry(&self, user_id: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_entries
    }

    pub fn lowest_score(&self) -> Option<i64> {
        self.entries.last().map(|e| e.score)
    }

    /// Inserts or updates a user's score.
    ///
    /// A new user on a full board is only admitted with a score strictly
    /// greater than the current lowest, which gets evicted.
    pub fn add_entry(
        &mut self,
        user_id: &str,
        display_name: &str,
        score: i64,
    ) -> Result<LeaderboardEntry, GameError> {
        if score < 0 {
            return Err(GameError::InvalidScore(score));
        }

        let now = Utc::now();
        match self.entries.iter_mut().find(|e| e.user_id == user_id) {
            Some(entry) => {
                entry.score = score;
                entry.display_name = display_name.to_string();
                entry.updated_at = now;
            }
            None => {
                if self.is_full() {
                    match self.lowest_score() {
                        Some(lowest) if score > lowest => {
                            self.entries.pop();
                        }
                        lowest => {
                            return Err(GameError::LeaderboardFull {
                                leaderboard_id: self.id.clone(),
                                lowest_score: lowest.unwrap_or_default(),
                            });
                        }
                    }
                }
                self.entries.push(LeaderboardEntry {
                    user_id: user_id.to_string(),
                    display_name: display_name.to_string(),
                    score,
                    rank: 0,
                    updated_at: now,
                });
            }
        }

        self.rerank(now);
        self.entry(user_id)
            .cloned()
            .ok_or_else(|| self.not_found(user_id))
    }

    pub fn user_rank(&self, user_id: &str) -> Result<u32, GameError> {
        self.entry(user_id)
            .map(|e| e.rank)
            .ok_or_else(|| self.not_found(user_id))
    }

    /// The first `min(n, len)` entries.
    pub fn top_entries(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    pub fn remove_user(&mut self, user_id: &str) -> Result<LeaderboardEntry, GameError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.user_id == user_id)
            .ok_or_else(|| self.not_found(user_id))?;

        let removed = self.entries.remove(position);
        self.rerank(Utc::now());
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.updated_at = Utc::now();
    }

    /// Aggregates over the current entries, zeros when empty.
    pub fn stats(&self) -> LeaderboardStats {
        let count = self.entries.len();
        if count == 0 {
            return LeaderboardStats {
                count: 0,
                average_score: 0.0,
                max_score: 0,
                min_score: 0,
                last_updated: self.updated_at,
            };
        }

        let total: i128 = self.entries.iter().map(|e| i128::from(e.score)).sum();
        LeaderboardStats {
            count,
            average_score: total as f64 / count as f64,
            max_score: self.entries[0].score,
            min_score: self.entries[count - 1].score,
            last_updated: self.updated_at,
        }
    }

    fn rerank(&mut self, now: DateTime<Utc>) {
        // `sort_by` is stable: ties keep their current order.
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = position as u32 + 1;
        }
        self.updated_at = now;
    }

    fn not_found(&self, user_id: &str) -> GameError {
        GameError::EntryNotFound {
            leaderboard_id: self.id.clone(),
            user_id: user_id.to_string(),
        }
    }
}
