use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;
use crate::routes::puzzles::session_json;
use crate::state::AppState;

/// POST /api/daily
/// Open a session on today's Lichess puzzle. The solver plays the side to move.
pub async fn start_daily(
    Extension(state): Extension<AppState>,
) -> Result<Json<JsonValue>, AppError> {
    let daily = state
        .lichess
        .fetch_daily()
        .await
        .map_err(|e| AppError::Unavailable(format!("Daily puzzle unavailable: {e}")))?;

    let session = daily.into_session()?;
    let view = session.view();
    let puzzle_id = view.puzzle_id.clone();
    let id = state.sessions.insert(session).await;
    tracing::info!("Opened daily session {id} on puzzle {puzzle_id}");

    let mut body = session_json(id, view);
    body["daily"] = json!(true);
    Ok(Json(body))
}
