use std::env;
use std::path::PathBuf;
use std::time::Duration;

use trainer_core::{ExhaustedPolicy, RetryPolicy};

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub puzzle_db_path: PathBuf,
    pub high_score_path: PathBuf,
    /// Remote analysis endpoint; empty disables it (material count only).
    pub analysis_url: String,
    pub analysis_depth: u32,
    pub analysis_max_thinking_ms: u64,
    pub analysis_timeout_ms: u64,
    pub analysis_max_attempts: u32,
    pub analysis_backoff_ms: u64,
    pub analysis_on_exhausted: ExhaustedPolicy,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_url: String,
    pub lichess_url: String,
    /// Idle sessions and survival games are dropped after this long.
    pub session_ttl_secs: u64,
    /// Upper bound per registry; the least recently used entry goes first.
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            puzzle_db_path: PathBuf::from("data/puzzles.json"),
            high_score_path: PathBuf::from("data/high_score.json"),
            analysis_url: "https://chess-api.com/v1".to_string(),
            analysis_depth: 12,
            analysis_max_thinking_ms: 50,
            analysis_timeout_ms: 4000,
            analysis_max_attempts: 5,
            analysis_backoff_ms: 400,
            analysis_on_exhausted: ExhaustedPolicy::MaterialFallback,
            openai_api_key: None,
            openai_model: "gpt-4".to_string(),
            openai_url: "https://api.openai.com/v1/chat/completions".to_string(),
            lichess_url: "https://lichess.org".to_string(),
            session_ttl_secs: 3600,
            max_sessions: 1000,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            puzzle_db_path: env::var("PUZZLE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.puzzle_db_path),
            high_score_path: env::var("HIGH_SCORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.high_score_path),
            analysis_url: env::var("ANALYSIS_URL").unwrap_or(defaults.analysis_url),
            analysis_depth: parsed("ANALYSIS_DEPTH").unwrap_or(defaults.analysis_depth),
            analysis_max_thinking_ms: parsed("ANALYSIS_MAX_THINKING_MS")
                .unwrap_or(defaults.analysis_max_thinking_ms),
            analysis_timeout_ms: parsed("ANALYSIS_TIMEOUT_MS")
                .unwrap_or(defaults.analysis_timeout_ms),
            analysis_max_attempts: parsed::<u32>("ANALYSIS_MAX_ATTEMPTS")
                .map(|n| n.max(1))
                .unwrap_or(defaults.analysis_max_attempts),
            analysis_backoff_ms: parsed("ANALYSIS_BACKOFF_MS")
                .unwrap_or(defaults.analysis_backoff_ms),
            analysis_on_exhausted: env::var("ANALYSIS_ON_EXHAUSTED")
                .ok()
                .and_then(|v| ExhaustedPolicy::parse(&v))
                .unwrap_or(defaults.analysis_on_exhausted),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_url: env::var("OPENAI_URL").unwrap_or(defaults.openai_url),
            lichess_url: env::var("LICHESS_URL").unwrap_or(defaults.lichess_url),
            session_ttl_secs: parsed("SESSION_TTL_SECS").unwrap_or(defaults.session_ttl_secs),
            max_sessions: parsed::<usize>("MAX_SESSIONS")
                .map(|n| n.max(1))
                .unwrap_or(defaults.max_sessions),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.analysis_max_attempts,
            backoff: Duration::from_millis(self.analysis_backoff_ms),
            timeout: Duration::from_millis(self.analysis_timeout_ms),
            on_exhausted: self.analysis_on_exhausted,
        }
    }
}
