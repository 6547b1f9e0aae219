#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use reqwest::Client;
use serde_json::Value;
use server::app::create_router;
use server::config::Config;
use server::state::AppState;
use tokio::net::TcpListener;
use trainer_core::{ExhaustedPolicy, PuzzleDatabase};

/// Black blunders with ...g6 and white wins the rook on a8.
pub const ROOK_WIN_FEN: &str = "r5k1/5ppp/8/8/8/8/5PPP/R5K1 b - - 0 1";
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", std::process::id(), ts % 1_000_000_000)
}

pub fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("puzzle-trainer-{name}-{}.json", unique_suffix()))
}

/// Serve a router on an OS-assigned port, return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", addr.port())
}

/// Config with fast retries and no remote services.
pub fn test_config() -> Config {
    Config {
        high_score_path: temp_file("high-score"),
        analysis_url: String::new(),
        analysis_timeout_ms: 200,
        analysis_max_attempts: 3,
        analysis_backoff_ms: 20,
        analysis_on_exhausted: ExhaustedPolicy::MaterialFallback,
        openai_api_key: None,
        openai_url: "http://127.0.0.1:9/unreachable".to_string(),
        lichess_url: "http://127.0.0.1:9".to_string(),
        ..Config::default()
    }
}

pub fn record(id: &str, fen: &str, moves: &str, rating: i32) -> Value {
    serde_json::json!({
        "PuzzleId": id,
        "FEN": fen,
        "Moves": moves,
        "Rating": rating,
        "Themes": "advantage short",
        "Difficulty": "beginner",
        "Position": "endgame",
    })
}

/// Start the trainer with the given puzzle records.
pub async fn start_server(config: Config, records: Vec<Value>) -> String {
    let db = PuzzleDatabase::from_json(&Value::Array(records).to_string()).unwrap();
    let state = AppState::new(config, db).unwrap();
    spawn(create_router(state)).await
}

// ---------------------------------------------------------------------------
// Mock analysis service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Hang,
}

pub struct MockAnalysis {
    reply: Reply,
    calls: AtomicU32,
    fens: Mutex<Vec<String>>,
}

impl MockAnalysis {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fens(&self) -> Vec<String> {
        self.fens.lock().unwrap().clone()
    }
}

async fn analyze(
    Extension(mock): Extension<Arc<MockAnalysis>>,
    Json(body): Json<Value>,
) -> Response {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    mock.fens
        .lock()
        .unwrap()
        .push(body["fen"].as_str().unwrap_or_default().to_string());

    match &mock.reply {
        Reply::Json(value) => Json(value.clone()).into_response(),
        Reply::Status(code) => StatusCode::from_u16(*code).unwrap().into_response(),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            StatusCode::OK.into_response()
        }
    }
}

/// Start a fake analysis endpoint; returns its URL and call log.
pub async fn mock_analysis(reply: Reply) -> (String, Arc<MockAnalysis>) {
    let mock = Arc::new(MockAnalysis {
        reply,
        calls: AtomicU32::new(0),
        fens: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/", post(analyze))
        .layer(Extension(mock.clone()));
    (spawn(app).await, mock)
}

/// Fake Lichess serving a fixed daily puzzle.
pub async fn mock_lichess(daily: Value) -> String {
    let app = Router::new().route(
        "/api/puzzle/daily",
        get(move || {
            let daily = daily.clone();
            async move { Json(daily) }
        }),
    );
    spawn(app).await
}

/// Fake chat-completions endpoint.
pub async fn mock_openai(status: u16, content: &str) -> String {
    let content = content.to_string();
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move || {
            let content = content.clone();
            async move {
                let body = serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": content } }]
                });
                (StatusCode::from_u16(status).unwrap(), Json(body))
            }
        }),
    );
    format!("{}/v1/chat/completions", spawn(app).await)
}

pub async fn post_json(base: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let resp = client()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    (status, resp.json().await.unwrap_or(Value::Null))
}

pub async fn get_json(base: &str, path: &str) -> (StatusCode, Value) {
    let resp = client()
        .get(format!("{base}{path}"))
        .send()
        .await
        .expect("Failed to send request");
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    (status, resp.json().await.unwrap_or(Value::Null))
}
