use arena_types::{leaderboard::LeaderboardKind, matches::MatchState};

use crate::models::{Leaderboard, Match};

#[derive(Default, Clone)]
pub struct MatchFactoryOptions<'a> {
    pub participant_a: Option<&'a str>,
    pub participant_b: Option<&'a str>,
    pub state: Option<MatchState>,
    pub score_a: Option<i64>,
    pub score_b: Option<i64>,
}

#[derive(Default, Clone)]
pub struct LeaderboardFactoryOptions<'a> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub kind: Option<LeaderboardKind>,
    pub max_entries: Option<usize>,
    pub entries: Vec<(&'a str, i64)>,
}

/// Builds a match and walks it through the lifecycle up to the requested
/// state, applying scores while it is playing.
pub fn match_factory(options: MatchFactoryOptions) -> Match {
    let mut game = Match::new(
        options.participant_a.unwrap_or("player_a"),
        options.participant_b.unwrap_or("player_b"),
    )
    .expect("factory participants must be valid");

    let state = options.state.unwrap_or(MatchState::Waiting);
    if state == MatchState::Waiting {
        return game;
    }
    if state == MatchState::Cancelled {
        game.cancel().expect("waiting match can be cancelled");
        return game;
    }

    game.start().expect("waiting match can be started");
    let (a, b) = (game.participant_a.clone(), game.participant_b.clone());
    game.set_score(&a, options.score_a.unwrap_or(0)).unwrap();
    game.set_score(&b, options.score_b.unwrap_or(0)).unwrap();

    if state == MatchState::Finished {
        game.finish().expect("playing match can be finished");
    }
    game
}

pub fn leaderboard_factory(options: LeaderboardFactoryOptions) -> Leaderboard {
    let id = options.id.unwrap_or("global");
    let mut board = Leaderboard::new(
        id,
        options.name.unwrap_or(id),
        options.kind.unwrap_or(LeaderboardKind::Global),
        options.max_entries.unwrap_or(100),
    );

    for (user_id, score) in options.entries {
        board
            .add_entry(user_id, user_id, score)
            .expect("factory entries must fit the board");
    }
    board
}
