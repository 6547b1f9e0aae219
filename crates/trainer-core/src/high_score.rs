//! Best survival result, persisted as a small JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::TrainerError;
use crate::survival::SurvivalRun;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighScore {
    pub best_rating: i32,
    pub puzzles_solved: u32,
    pub best_streak: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl HighScore {
    /// Fold a run in. Returns true if anything improved.
    pub fn merge(&mut self, run: &SurvivalRun) -> bool {
        let mut improved = false;
        if run.score > 0 && run.target_rating > self.best_rating {
            self.best_rating = run.target_rating;
            improved = true;
        }
        if run.score > self.puzzles_solved {
            self.puzzles_solved = run.score;
            improved = true;
        }
        if run.best_streak > self.best_streak {
            self.best_streak = run.best_streak;
            improved = true;
        }
        if improved {
            self.updated_at = Some(Utc::now());
        }
        improved
    }
}

/// Clones share one update lock, so concurrent runs merge one at a time.
#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
    update: Arc<Mutex<()>>,
}

impl HighScoreStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            update: Arc::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files count as no high score yet.
    pub fn load(&self) -> HighScore {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No high score file");
                return HighScore::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Corrupt high score file, starting fresh");
            HighScore::default()
        })
    }

    pub fn save(&self, score: &HighScore) -> Result<(), TrainerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(score)?)?;
        Ok(())
    }

    /// Merge a finished run and persist on improvement. Write failures are
    /// logged, never surfaced.
    pub async fn record_run(&self, run: &SurvivalRun) -> HighScore {
        let _guard = self.update.lock().await;
        let mut score = self.load();
        if score.merge(run) {
            if let Err(e) = self.save(&score) {
                warn!(path = %self.path.display(), error = %e, "Failed to save high score");
            }
        }
        score
    }
}
