use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use trainer_core::review::review_move;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReviewBody {
    pub before_fen: String,
    pub after_fen: String,
}

/// POST /api/review/move
pub async fn review(
    Extension(state): Extension<AppState>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<JsonValue>, AppError> {
    let review = review_move(&body.before_fen, &body.after_fen, &state.evaluator).await?;
    Ok(Json(json!(review)))
}
