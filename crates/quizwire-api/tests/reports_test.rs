//! Integration tests for the reporting routes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use quizwire_core::archive::{GameSummary, PlayerTotals};
use quizwire_test_support::RecordingArchive;
use uuid::Uuid;

use common::{build_test_app, get_json};

fn summary(session_ext_id: &str) -> GameSummary {
    GameSummary {
        id: Uuid::new_v4(),
        session_ext_id: session_ext_id.to_owned(),
        question_count: 5,
        status: "completed".to_owned(),
        created_at: Utc.with_ymd_and_hms(2026, 2, 1, 18, 0, 0).unwrap(),
        completed_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 18, 30, 0).unwrap()),
        winner_name: Some("alice".to_owned()),
        total_players: 2,
    }
}

#[tokio::test]
async fn test_recent_games_returns_seeded_rows() {
    let archive = Arc::new(RecordingArchive::new());
    archive.seed_games(vec![summary("quiz-1"), summary("quiz-2")]);
    let app = build_test_app(archive);

    let (status, body) = get_json(app, "/api/v1/reports/recent-games").await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["session_ext_id"], "quiz-1");
    assert_eq!(rows[0]["winner_name"], "alice");
}

#[tokio::test]
async fn test_recent_games_honors_limit() {
    let archive = Arc::new(RecordingArchive::new());
    archive.seed_games(vec![summary("quiz-1"), summary("quiz-2"), summary("quiz-3")]);
    let app = build_test_app(archive);

    let (status, body) = get_json(app, "/api/v1/reports/recent-games?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_game_details_found() {
    let archive = Arc::new(RecordingArchive::new());
    let game = summary("quiz-1");
    let game_id = game.id;
    archive.seed_games(vec![game]);
    let app = build_test_app(archive);

    let (status, body) = get_json(app, &format!("/api/v1/reports/games/{game_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["session_ext_id"], "quiz-1");
}

#[tokio::test]
async fn test_game_details_unknown_id_is_404() {
    let app = build_test_app(Arc::new(RecordingArchive::new()));

    let (status, body) =
        get_json(app, &format!("/api/v1/reports/games/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_top_players_returns_seeded_rows() {
    let archive = Arc::new(RecordingArchive::new());
    archive.seed_players(vec![
        PlayerTotals {
            name: "alice".to_owned(),
            total_wins: 4,
            total_games: 6,
            total_points: 40,
        },
        PlayerTotals {
            name: "bob".to_owned(),
            total_wins: 1,
            total_games: 6,
            total_points: 12,
        },
    ]);
    let app = build_test_app(archive);

    let (status, body) = get_json(app, "/api/v1/reports/top-players").await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "alice");
    assert_eq!(rows[0]["total_wins"], 4);
}
