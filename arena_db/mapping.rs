use arena_game::models as game_models;
use arena_types::{
    common, errors::DbError, leaderboard::LeaderboardKind, matches::MatchState,
};

use crate::models as db_models;

impl From<&common::User> for db_models::User {
    fn from(user: &common::User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<db_models::User> for common::User {
    fn from(row: db_models::User) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

impl From<&common::UserStats> for db_models::UserStats {
    fn from(stats: &common::UserStats) -> Self {
        Self {
            user_id: stats.user_id.clone(),
            total_games: stats.total_games as i32,
            wins: stats.wins as i32,
            losses: stats.losses as i32,
            total_score: stats.total_score,
            updated_at: stats.updated_at,
        }
    }
}

impl From<db_models::UserStats> for common::UserStats {
    fn from(row: db_models::UserStats) -> Self {
        let average_score = if row.total_games > 0 {
            row.total_score as f64 / row.total_games as f64
        } else {
            0.0
        };

        Self {
            user_id: row.user_id,
            total_games: row.total_games.max(0) as u32,
            wins: row.wins.max(0) as u32,
            losses: row.losses.max(0) as u32,
            total_score: row.total_score,
            average_score,
            updated_at: row.updated_at,
        }
    }
}

fn state_name(state: MatchState) -> &'static str {
    match state {
        MatchState::Waiting => "waiting",
        MatchState::Playing => "playing",
        MatchState::Finished => "finished",
        MatchState::Cancelled => "cancelled",
    }
}

fn parse_state(name: &str) -> Result<MatchState, DbError> {
    match name {
        "waiting" => Ok(MatchState::Waiting),
        "playing" => Ok(MatchState::Playing),
        "finished" => Ok(MatchState::Finished),
        "cancelled" => Ok(MatchState::Cancelled),
        other => Err(DbError::InvalidRecord(format!("unknown match state '{other}'"))),
    }
}

impl From<&game_models::Match> for db_models::Match {
    fn from(game: &game_models::Match) -> Self {
        Self {
            id: game.id,
            participant_a: game.participant_a.clone(),
            participant_b: game.participant_b.clone(),
            state: state_name(game.state).to_string(),
            score_a: game.score_a,
            score_b: game.score_b,
            winner_id: game.winner_id.clone(),
            created_at: game.created_at,
            started_at: game.started_at,
            finished_at: game.finished_at,
        }
    }
}

impl TryFrom<db_models::Match> for game_models::Match {
    type Error = DbError;

    fn try_from(row: db_models::Match) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            participant_a: row.participant_a,
            participant_b: row.participant_b,
            state: parse_state(&row.state)?,
            score_a: row.score_a,
            score_b: row.score_b,
            winner_id: row.winner_id,
            created_at: row.created_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

fn kind_name(kind: LeaderboardKind) -> &'static str {
    match kind {
        LeaderboardKind::Global => "global",
        LeaderboardKind::Weekly => "weekly",
        LeaderboardKind::Monthly => "monthly",
        LeaderboardKind::Seasonal => "seasonal",
    }
}

fn parse_kind(name: &str) -> Result<LeaderboardKind, DbError> {
    match name {
        "global" => Ok(LeaderboardKind::Global),
        "weekly" => Ok(LeaderboardKind::Weekly),
        "monthly" => Ok(LeaderboardKind::Monthly),
        "seasonal" => Ok(LeaderboardKind::Seasonal),
        other => Err(DbError::InvalidRecord(format!(
            "unknown leaderboard kind '{other}'"
        ))),
    }
}

/// A leaderboard row with its entry rows.
pub struct LeaderboardAggregate {
    pub leaderboard: db_models::Leaderboard,
    pub entries: Vec<db_models::LeaderboardEntry>,
}

impl From<&game_models::Leaderboard> for LeaderboardAggregate {
    fn from(board: &game_models::Leaderboard) -> Self {
        let entries = board
            .entries()
            .iter()
            .map(|e| db_models::LeaderboardEntry {
                leaderboard_id: board.id.clone(),
                user_id: e.user_id.clone(),
                display_name: e.display_name.clone(),
                score: e.score,
                rank: e.rank as i32,
                updated_at: e.updated_at,
            })
            .collect();

        Self {
            leaderboard: db_models::Leaderboard {
                id: board.id.clone(),
                name: board.name.clone(),
                kind: kind_name(board.kind).to_string(),
                max_entries: board.max_entries as i64,
                created_at: board.created_at,
                updated_at: board.updated_at,
            },
            entries,
        }
    }
}

impl From<db_models::LeaderboardEntry> for arena_types::leaderboard::LeaderboardEntry {
    fn from(row: db_models::LeaderboardEntry) -> Self {
        Self {
            user_id: row.user_id,
            display_name: row.display_name,
            score: row.score,
            rank: row.rank.max(0) as u32,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<LeaderboardAggregate> for game_models::Leaderboard {
    type Error = DbError;

    fn try_from(agg: LeaderboardAggregate) -> Result<Self, Self::Error> {
        let row = agg.leaderboard;
        let max_entries = usize::try_from(row.max_entries).map_err(|_| {
            DbError::InvalidRecord(format!("negative capacity for leaderboard '{}'", row.id))
        })?;

        Ok(game_models::Leaderboard::from_entries(
            &row.id,
            &row.name,
            parse_kind(&row.kind)?,
            max_entries,
            agg.entries.into_iter().map(Into::into).collect(),
            row.created_at,
            row.updated_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_game::test_utils::{
        LeaderboardFactoryOptions, MatchFactoryOptions, leaderboard_factory, match_factory,
    };

    #[test]
    fn test_match_row_keeps_every_field() {
        let game = match_factory(MatchFactoryOptions {
            state: Some(MatchState::Finished),
            score_a: Some(7),
            score_b: Some(3),
            ..Default::default()
        });

        let row = db_models::Match::from(&game);
        assert_eq!(row.state, "finished");
        assert_eq!(game_models::Match::try_from(row).unwrap(), game);
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let game = match_factory(MatchFactoryOptions::default());
        let mut row = db_models::Match::from(&game);
        row.state = "paused".to_string();

        assert!(matches!(
            game_models::Match::try_from(row),
            Err(DbError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_stats_average_is_derived() {
        let mut stats = common::UserStats::new("p1");
        stats.record_match(30, common::MatchOutcome::Win);
        stats.record_match(10, common::MatchOutcome::Loss);

        let restored = common::UserStats::from(db_models::UserStats::from(&stats));
        assert_eq!(restored.average_score, 20.0);
        assert_eq!((restored.wins, restored.losses), (1, 1));

        let empty = common::UserStats::from(db_models::UserStats::from(
            &common::UserStats::new("p2"),
        ));
        assert_eq!(empty.average_score, 0.0);
    }

    #[test]
    fn test_leaderboard_aggregate_rebuilds_the_board() {
        let board = leaderboard_factory(LeaderboardFactoryOptions {
            id: Some("weekly"),
            kind: Some(LeaderboardKind::Weekly),
            max_entries: Some(3),
            entries: vec![("a", 50), ("b", 80), ("c", 65)],
            ..Default::default()
        });

        let mut agg = LeaderboardAggregate::from(&board);
        assert_eq!(agg.leaderboard.kind, "weekly");
        // Row order is irrelevant, the board is re-ranked on load.
        agg.entries.reverse();

        let restored = game_models::Leaderboard::try_from(agg).unwrap();
        assert_eq!(restored, board);
    }
}
