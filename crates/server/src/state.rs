use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use trainer_core::high_score::HighScoreStore;
use trainer_core::{PositionEvaluator, PuzzleDatabase, PuzzleSession, SurvivalGame};
use uuid::Uuid;

use crate::clients::analysis::HttpAnalysis;
use crate::clients::coach::CoachClient;
use crate::clients::lichess::LichessClient;
use crate::config::Config;

struct Entry<T> {
    value: Arc<Mutex<T>>,
    touched: Instant,
}

/// Live sessions keyed by id.
///
/// Entries idle longer than `ttl` are dropped, and the registry never holds
/// more than `capacity` entries. Sessions are locked one at a time; the map
/// lock is only held to look up or insert an entry.
pub struct Registry<T> {
    entries: Mutex<HashMap<Uuid, Entry<T>>>,
    ttl: Duration,
    capacity: usize,
}

impl<T> Registry<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub async fn insert(&self, value: T) -> Uuid {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.len();

        entries.retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        while entries.len() >= self.capacity {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| *id)
            else {
                break;
            };
            entries.remove(&oldest);
        }

        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = entries.len(), "Evicted stale sessions");
        }

        let id = Uuid::new_v4();
        entries.insert(
            id,
            Entry {
                value: Arc::new(Mutex::new(value)),
                touched: now,
            },
        );
        id
    }

    /// Fetch an entry and mark it as used. Expired entries read as missing.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<T>>> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let expired = match entries.get_mut(id) {
            Some(entry) if now.duration_since(entry.touched) < self.ttl => {
                entry.touched = now;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(id);
        }
        None
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub puzzles: Arc<PuzzleDatabase>,
    pub evaluator: PositionEvaluator,
    pub sessions: Arc<Registry<PuzzleSession>>,
    pub survival: Arc<Registry<SurvivalGame>>,
    pub high_scores: HighScoreStore,
    pub coach: Arc<CoachClient>,
    pub lichess: Arc<LichessClient>,
}

impl AppState {
    pub fn new(config: Config, puzzles: PuzzleDatabase) -> Result<Self, String> {
        let evaluator = if config.analysis_url.trim().is_empty() {
            tracing::info!("No analysis URL configured - material count only");
            PositionEvaluator::material_only()
        } else {
            tracing::info!("Remote analysis at {}", config.analysis_url);
            PositionEvaluator::new(Arc::new(HttpAnalysis::new(&config)?), config.retry_policy())
        };

        Ok(Self {
            puzzles: Arc::new(puzzles),
            evaluator,
            sessions: Arc::new(Registry::new(config.session_ttl(), config.max_sessions)),
            survival: Arc::new(Registry::new(config.session_ttl(), config.max_sessions)),
            high_scores: HighScoreStore::new(config.high_score_path.clone()),
            coach: Arc::new(CoachClient::new(&config)?),
            lichess: Arc::new(LichessClient::new(&config)?),
            config,
        })
    }

    pub fn with_evaluator(mut self, evaluator: PositionEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }
}
