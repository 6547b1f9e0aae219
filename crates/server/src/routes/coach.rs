use axum::{extract::Query, http::StatusCode, Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::clients::coach::HintRequest;
use crate::state::AppState;

/// GET /api/getHint?fen=...&solutionMove=...
/// Coach explanation for the current position. Always 200 once `fen` is given.
pub async fn get_hint(
    Extension(state): Extension<AppState>,
    Query(req): Query<HintRequest>,
) -> (StatusCode, Json<JsonValue>) {
    let Some(fen) = req.fen.clone().filter(|f| !f.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "FEN is required" })),
        );
    };

    tracing::info!(
        "Coach hint for {fen} (solution {:?}, type {:?})",
        req.solution_move,
        req.puzzle_type
    );
    let resp = state.coach.hint(&req, &fen).await;
    (StatusCode::OK, Json(json!(resp)))
}
