use anyhow::Context;
use server::app::create_router;
use server::config::Config;
use server::state::AppState;
use trainer_core::PuzzleDatabase;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    tracing::info!("Loading puzzle database from {}", config.puzzle_db_path.display());
    let puzzles = PuzzleDatabase::load(&config.puzzle_db_path)
        .context("Failed to load puzzle database")?;
    if puzzles.is_empty() {
        tracing::warn!("Puzzle database is empty");
    }

    let state = AppState::new(config.clone(), puzzles)
        .map_err(anyhow::Error::msg)
        .context("Failed to build application state")?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
