use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use trainer_core::{ReviewError, TrainerError, UnusablePuzzle};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<TrainerError> for AppError {
    fn from(e: TrainerError) -> Self {
        match e {
            TrainerError::AlreadySolved | TrainerError::RunOver => AppError::Conflict(e.to_string()),
            TrainerError::NoUsablePuzzle(_) | TrainerError::NoPuzzleLoaded => {
                AppError::Unavailable(e.to_string())
            }
            TrainerError::Replay(_) => AppError::BadRequest(e.to_string()),
            TrainerError::Database(_) | TrainerError::Io(_) | TrainerError::Json(_) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<UnusablePuzzle> for AppError {
    fn from(e: UnusablePuzzle) -> Self {
        match e {
            UnusablePuzzle::Evaluation(_) => AppError::Unavailable(e.to_string()),
            _ => AppError::Unavailable(format!("Puzzle unusable: {e}")),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::Position(_) | ReviewError::NoConnectingMove => {
                AppError::BadRequest(e.to_string())
            }
            ReviewError::Evaluation(_) => AppError::Unavailable(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
