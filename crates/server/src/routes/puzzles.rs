use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex;
use trainer_core::survival::MAX_DRAWS;
use trainer_core::{PuzzleSession, SessionView, TrainerError};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewPuzzleBody {
    pub difficulty: Option<String>,
    pub position: Option<String>,
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub uci: String,
}

pub(crate) fn session_json(id: Uuid, view: SessionView) -> JsonValue {
    json!({
        "session_id": id,
        "session": view,
    })
}

/// POST /api/puzzles
/// Draw a puzzle (optionally filtered) and open a session on it.
pub async fn create_puzzle(
    Extension(state): Extension<AppState>,
    Json(body): Json<NewPuzzleBody>,
) -> Result<Json<JsonValue>, AppError> {
    let mut rng = StdRng::from_entropy();

    for draw in 1..=MAX_DRAWS {
        let Some(puzzle) = state.puzzles.random_for(
            body.difficulty.as_deref(),
            body.position.as_deref(),
            &mut rng,
        ) else {
            return Err(AppError::NotFound("Puzzle database is empty".to_string()));
        };
        let puzzle_id = puzzle.id.clone();

        match PuzzleSession::prepare(puzzle, &state.evaluator).await {
            Ok(session) => {
                let view = session.view();
                let id = state.sessions.insert(session).await;
                tracing::info!("Opened session {id} on puzzle {puzzle_id} (draw {draw})");
                return Ok(Json(session_json(id, view)));
            }
            Err(e) => tracing::warn!("Discarding puzzle {puzzle_id}: {e}"),
        }
    }

    Err(TrainerError::NoUsablePuzzle(MAX_DRAWS).into())
}

pub(crate) async fn find_session(
    state: &AppState,
    id: Uuid,
) -> Result<Arc<Mutex<PuzzleSession>>, AppError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// GET /api/puzzles/{id}
pub async fn get_puzzle(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let session = find_session(&state, id).await?;
    let session = session.lock().await;
    Ok(Json(session_json(id, session.view())))
}

/// POST /api/puzzles/{id}/move
pub async fn submit_move(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MoveBody>,
) -> Result<Json<JsonValue>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let outcome = session.submit_move(&body.uci)?;
    Ok(Json(json!({
        "outcome": outcome,
        "session": session.view(),
    })))
}

/// POST /api/puzzles/{id}/hint
pub async fn hint(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let step = session
        .hint()
        .ok_or_else(|| AppError::Conflict("Puzzle is already solved".to_string()))?;
    Ok(Json(json!({
        "hint": step,
        "message": step.message(),
    })))
}
