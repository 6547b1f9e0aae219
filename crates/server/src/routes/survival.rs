use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex;
use trainer_core::{SessionView, SurvivalGame, SurvivalRun};
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::puzzles::MoveBody;
use crate::state::AppState;

fn game_json(id: Uuid, run: &SurvivalRun, session: Option<SessionView>) -> JsonValue {
    json!({
        "game_id": id,
        "run": run,
        "game_over": run.is_over(),
        "session": session,
    })
}

async fn find_game(state: &AppState, id: Uuid) -> Result<Arc<Mutex<SurvivalGame>>, AppError> {
    state
        .survival
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Survival game {id} not found")))
}

/// POST /api/survival
pub async fn start(Extension(state): Extension<AppState>) -> Result<Json<JsonValue>, AppError> {
    let mut rng = StdRng::from_entropy();
    let mut game = SurvivalGame::default();
    game.restart(&state.puzzles, &state.evaluator, &mut rng).await?;

    let run = game.run().clone();
    let view = game.session().map(|s| s.view());
    let id = state.survival.insert(game).await;
    tracing::info!("Survival game {id} started");
    Ok(Json(game_json(id, &run, view)))
}

/// GET /api/survival/{id}
pub async fn get_game(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let game = find_game(&state, id).await?;
    let game = game.lock().await;
    Ok(Json(game_json(id, game.run(), game.session().map(|s| s.view()))))
}

/// POST /api/survival/{id}/move
/// A wrong move costs a life; a solve loads the next puzzle. The high score
/// is updated when the last life is lost.
pub async fn submit_move(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MoveBody>,
) -> Result<Json<JsonValue>, AppError> {
    let game = find_game(&state, id).await?;
    let mut game = game.lock().await;
    let mut rng = StdRng::from_entropy();

    let result = game
        .submit_move(&body.uci, &state.puzzles, &state.evaluator, &mut rng)
        .await?;

    let high_score = if result.game_over {
        Some(state.high_scores.record_run(&result.run).await)
    } else {
        None
    };

    Ok(Json(json!({
        "game_id": id,
        "result": result,
        "session": game.session().map(|s| s.view()),
        "high_score": high_score,
    })))
}

/// POST /api/survival/{id}/hint
pub async fn hint(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let game = find_game(&state, id).await?;
    let mut game = game.lock().await;
    if game.run().is_over() {
        return Err(AppError::Conflict("Run is over".to_string()));
    }
    let step = game
        .session_mut()
        .and_then(|s| s.hint())
        .ok_or_else(|| AppError::Conflict("No puzzle in progress".to_string()))?;
    Ok(Json(json!({
        "hint": step,
        "message": step.message(),
    })))
}

/// POST /api/survival/{id}/restart
pub async fn restart(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let game = find_game(&state, id).await?;
    let mut game = game.lock().await;
    let mut rng = StdRng::from_entropy();
    game.restart(&state.puzzles, &state.evaluator, &mut rng).await?;
    Ok(Json(game_json(id, game.run(), game.session().map(|s| s.view()))))
}

/// GET /api/high-score
pub async fn high_score(Extension(state): Extension<AppState>) -> Json<JsonValue> {
    Json(json!(state.high_scores.load()))
}
