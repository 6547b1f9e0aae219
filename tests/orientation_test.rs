//! End-to-end orientation tests: the board faces the side the final
//! position favours, the solver always has the move, and remote analysis
//! failures are bounded.
//!
//! Each test starts its own server and a fake analysis endpoint.

mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use common::{mock_analysis, post_json, record, start_server, test_config, Reply};
use serde_json::{json, Value};
use trainer_core::ExhaustedPolicy;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn open_puzzle(base: &str) -> (StatusCode, Value) {
    post_json(base, "/api/puzzles", json!({})).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_level_final_position_faces_side_to_move() {
    let (url, mock) = mock_analysis(Reply::Json(json!({"centipawns": "0", "move": "e7e5"}))).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base = start_server(config, vec![record("p1", common::START_FEN, "e2e4", 700)]).await;

    let (status, body) = open_puzzle(&base).await;
    assert_eq!(status, StatusCode::OK);
    let session = &body["session"];
    assert_eq!(session["orientation"], "white");
    assert_eq!(session["turn"], "white");
    assert_eq!(session["progress"], 0);
    assert_eq!(session["evaluation"]["source"], "remote");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_winning_side_gets_board_and_opening_move_is_auto_played() {
    let (url, _mock) = mock_analysis(Reply::Json(json!({"eval": 5.0, "move": "g8f8"}))).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (_, body) = open_puzzle(&base).await;
    let session = &body["session"];
    assert_eq!(session["orientation"], "white");
    assert_eq!(session["turn"], "white");
    assert_eq!(session["progress"], 1);
    assert_eq!(session["history"][0]["move"], "g7g6");
    assert_eq!(session["evaluation"]["centipawns"], 500);
}

#[tokio::test]
async fn test_black_advantage_faces_black() {
    let (url, _mock) = mock_analysis(Reply::Json(json!({"centipawns": -300}))).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (_, body) = open_puzzle(&base).await;
    assert_eq!(body["session"]["orientation"], "black");
    assert_eq!(body["session"]["turn"], "black");
    assert_eq!(body["session"]["progress"], 0);
}

#[tokio::test]
async fn test_hanging_analysis_is_retried_then_falls_back_to_material() {
    let (url, mock) = mock_analysis(Reply::Hang).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let started = Instant::now();
    let (status, body) = open_puzzle(&base).await;
    let elapsed = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(mock.calls(), 3);
    assert_eq!(body["session"]["evaluation"]["source"], "material");
    assert_eq!(body["session"]["orientation"], "white");
    // 3 x 200ms timeouts plus 2 x 20ms backoff
    assert!(elapsed >= Duration::from_millis(640));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_server_errors_are_retried_up_to_the_limit() {
    let (url, mock) = mock_analysis(Reply::Status(502)).await;
    let config = server::config::Config {
        analysis_url: url,
        analysis_max_attempts: 4,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (status, _) = open_puzzle(&base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mock.calls(), 4);
}

#[tokio::test]
async fn test_quota_goes_straight_to_material() {
    let (url, mock) = mock_analysis(Reply::Status(429)).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (_, body) = open_puzzle(&base).await;
    assert_eq!(mock.calls(), 1);
    assert_eq!(body["session"]["evaluation"]["source"], "material");
    assert_eq!(body["session"]["orientation"], "white");
}

#[tokio::test]
async fn test_high_usage_body_counts_as_quota() {
    let (url, mock) =
        mock_analysis(Reply::Json(json!({"type": "error", "error": "HIGH_USAGE"}))).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (_, body) = open_puzzle(&base).await;
    assert_eq!(mock.calls(), 1);
    assert_eq!(body["session"]["evaluation"]["centipawns"], 500);
}

#[tokio::test]
async fn test_side_to_move_policy_when_analysis_is_down() {
    let (url, mock) = mock_analysis(Reply::Status(503)).await;
    let config = server::config::Config {
        analysis_url: url,
        analysis_on_exhausted: ExhaustedPolicy::SideToMove,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (status, body) = open_puzzle(&base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mock.calls(), 3);
    assert!(body["session"]["evaluation"].is_null());
    assert_eq!(body["session"]["orientation"], "black");
}

#[tokio::test]
async fn test_discard_policy_gives_up_after_bounded_draws() {
    let (url, mock) = mock_analysis(Reply::Status(500)).await;
    let config = server::config::Config {
        analysis_url: url,
        analysis_max_attempts: 2,
        analysis_on_exhausted: ExhaustedPolicy::Discard,
        ..test_config()
    };
    let base =
        start_server(config, vec![record("p1", common::ROOK_WIN_FEN, "g7g6 a1a8", 700)]).await;

    let (status, body) = open_puzzle(&base).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].as_str().unwrap().contains("No usable puzzle"));
    assert_eq!(mock.calls(), 2 * trainer_core::survival::MAX_DRAWS);
}

#[tokio::test]
async fn test_analyzer_never_sees_en_passant_field() {
    let (url, mock) = mock_analysis(Reply::Json(json!({"centipawns": 0}))).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    // After 1.e4 d5 2.e5, black plays ...f5 allowing exf6 e.p.
    let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2";
    let base = start_server(config, vec![record("ep", fen, "f7f5", 700)]).await;

    let (_, body) = open_puzzle(&base).await;
    assert_eq!(
        mock.fens(),
        vec!["rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3".to_string()]
    );
    // Level evaluation: the side to move at the start plays
    assert_eq!(body["session"]["orientation"], "black");
}

#[tokio::test]
async fn test_broken_puzzle_is_skipped_without_analysis() {
    let (url, mock) = mock_analysis(Reply::Json(json!({"centipawns": 0}))).await;
    let config = server::config::Config {
        analysis_url: url,
        ..test_config()
    };
    let base = start_server(config, vec![record("bad", common::START_FEN, "e2e5", 700)]).await;

    let (status, _) = open_puzzle(&base).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(mock.calls(), 0);
}
