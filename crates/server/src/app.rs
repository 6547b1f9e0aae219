use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::routes;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Puzzles
        .route("/api/puzzles", post(routes::puzzles::create_puzzle))
        .route("/api/puzzles/{id}", get(routes::puzzles::get_puzzle))
        .route("/api/puzzles/{id}/move", post(routes::puzzles::submit_move))
        .route("/api/puzzles/{id}/hint", post(routes::puzzles::hint))
        // Survival
        .route("/api/survival", post(routes::survival::start))
        .route("/api/survival/{id}", get(routes::survival::get_game))
        .route("/api/survival/{id}/move", post(routes::survival::submit_move))
        .route("/api/survival/{id}/hint", post(routes::survival::hint))
        .route("/api/survival/{id}/restart", post(routes::survival::restart))
        .route("/api/high-score", get(routes::survival::high_score))
        // Daily
        .route("/api/daily", post(routes::daily::start_daily))
        // Coach
        .route("/api/getHint", get(routes::coach::get_hint))
        // Review
        .route("/api/review/move", post(routes::review::review))
        // Shared state
        .layer(Extension(state))
        .layer(cors)
}
