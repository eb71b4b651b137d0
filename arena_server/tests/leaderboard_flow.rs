
use std::time::Duration;

use arena_app::{config::Config, leaderboard_service::UpdateKind, repository::UserRepository};
use arena_types::{errors::ErrorKind, leaderboard::LeaderboardKind};

use test_utils::tests::{leaderboard_service, setup_app};

#[tokio::test]
async fn test_subscriber_sees_match_winner() {
    let app = setup_app(Config::default()).await;
    app.add_users(&[("p1", "Player One"), ("p2", "Player Two")])
        .await;
    let mut subscription = app.leaderboards.subscribe("global").await.unwrap();

    let game = app.games.create_match("p1", "p2").await.unwrap();
    app.games.start_match(game.id).await.unwrap();
    app.games.update_score(game.id, "p1", 42).await.unwrap();
    app.games.end_match(game.id).await.unwrap();

    let update = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
        .await
        .expect("update should arrive")
        .unwrap();
    assert_eq!(update.leaderboard_id, "global");
    assert_eq!(
        update.kind,
        UpdateKind::ScoreUpdated {
            user_id: "p1".into(),
            display_name: "Player One".into(),
            score: 42,
            old_rank: None,
            new_rank: 1,
        }
    );

    app.wait_for_idle().await;
    assert!(subscription.receiver.try_recv().is_err());
    app.processor.stop().await;
}

#[tokio::test]
async fn test_cached_reads_follow_every_mutation() {
    let app = setup_app(Config::default()).await;
    app.add_users(&[("a", "Alice"), ("b", "Bob"), ("c", "Carol")])
        .await;
    let service = &app.leaderboards;

    service.add_score("global", "a", 50).await.unwrap();
    assert_eq!(service.get_top_entries("global", 3).await.unwrap().len(), 1);
    assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 1);

    service.add_score("global", "b", 80).await.unwrap();
    service.add_score("global", "c", 65).await.unwrap();

    let top = service.get_top_entries("global", 3).await.unwrap();
    let ids: Vec<_> = top.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
    assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 3);

    service.remove_user("global", "b").await.unwrap();
    assert_eq!(service.get_user_rank("global", "a").await.unwrap(), 2);

    let stats = service.get_stats("global").await.unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.max_score, 65);

    app.processor.stop().await;
}

#[tokio::test]
async fn test_expired_projections_are_rebuilt() {
    let config = Config {
        leaderboard_cache_ttl: Duration::from_millis(20),
        ..Config::default()
    };
    let app = setup_app(config).await;
    app.add_users(&[("a", "Alice")]).await;
    let service = &app.leaderboards;

    service.add_score("global", "a", 50).await.unwrap();
    service.get_stats("global").await.unwrap();
    assert!(app.cache.len().await > 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.cache.purge_expired().await > 0);
    assert_eq!(service.get_stats("global").await.unwrap().count, 1);

    app.processor.stop().await;
}

#[tokio::test]
async fn test_boards_survive_a_restart() {
    let app = setup_app(Config::default()).await;
    app.add_users(&[("a", "Alice"), ("b", "Bob")]).await;
    app.leaderboards
        .create_leaderboard("weekly", "Weekly", LeaderboardKind::Weekly, 2)
        .await
        .unwrap();
    app.leaderboards.add_score("weekly", "a", 10).await.unwrap();
    app.leaderboards.add_score("weekly", "b", 20).await.unwrap();
    app.processor.stop().await;

    // A fresh service over the same storage starts empty until loaded.
    let restarted = leaderboard_service(app.config.clone(), &app.store, app.cache.clone());
    assert_eq!(
        restarted.get_stats("weekly").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    restarted.load_leaderboard("weekly").await.unwrap();
    let board = restarted.get_leaderboard("weekly").await.unwrap();
    assert_eq!(board.kind, LeaderboardKind::Weekly);
    assert_eq!(board.max_entries, 2);
    let ranking: Vec<_> = board
        .entries()
        .iter()
        .map(|e| (e.user_id.as_str(), e.rank))
        .collect();
    assert_eq!(ranking, vec![("b", 1), ("a", 2)]);
}

#[tokio::test]
async fn test_full_board_keeps_the_best_winners() {
    let config = Config {
        default_max_entries: 2,
        ..Config::default()
    };
    let app = setup_app(config).await;
    app.add_users(&[
        ("p1", "Player One"),
        ("p2", "Player Two"),
        ("p3", "Player Three"),
        ("p4", "Player Four"),
    ])
    .await;

    let matches = [
        ("p1", "p2", 50),
        ("p3", "p4", 80),
        ("p2", "p4", 40),
        ("p4", "p1", 60),
    ];
    for (winner, loser, score) in matches {
        let game = app.games.create_match(winner, loser).await.unwrap();
        app.games.start_match(game.id).await.unwrap();
        app.games.update_score(game.id, winner, score).await.unwrap();
        app.games.end_match(game.id).await.unwrap();
        app.wait_for_idle().await;
    }

    let top = app.leaderboards.get_top_entries("global", 10).await.unwrap();
    let ranking: Vec<_> = top.iter().map(|e| (e.user_id.as_str(), e.score)).collect();
    // p2 (40) did not fit, p4 (60) evicted p1 (50).
    assert_eq!(ranking, vec![("p3", 80), ("p4", 60)]);

    // Stats are updated even when the leaderboard rejects the score.
    let p2 = app.users.get_stats("p2").await.unwrap();
    assert_eq!(p2.wins, 1);

    app.processor.stop().await;
}
