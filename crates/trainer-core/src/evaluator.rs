//! Position evaluation: remote analysis with bounded retry, material fallback.
//!
//! Scores are centipawns from white's point of view (positive = white better).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shakmaty::Chess;
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, EvaluateError};
use crate::material::material_balance;
use crate::position::wire_fen;

/// Result from a remote analyzer, already converted to white's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEvaluation {
    pub centipawns: i32,
    pub best_move: Option<String>,
}

/// A remote analysis collaborator. Receives the wire FEN (no en-passant
/// field) and returns one evaluation.
pub trait AnalysisService: Send + Sync {
    fn analyze<'a>(
        &'a self,
        fen: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteEvaluation, AnalysisError>> + Send + 'a>>;

    /// Service name for logging.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalSource {
    Remote,
    Material,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub centipawns: i32,
    pub source: EvalSource,
    pub best_move: Option<String>,
}

impl Evaluation {
    pub fn material(pos: &Chess) -> Self {
        Self {
            centipawns: material_balance(pos),
            source: EvalSource::Material,
            best_move: None,
        }
    }
}

/// What to do once every remote attempt has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedPolicy {
    /// Substitute the material balance.
    MaterialFallback,
    /// Report unavailable; the orientation falls back to the side to move.
    SideToMove,
    /// Report unavailable; the puzzle is discarded.
    Discard,
}

impl ExhaustedPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "material" | "material_fallback" => Some(Self::MaterialFallback),
            "side_to_move" | "default" => Some(Self::SideToMove),
            "discard" | "skip" => Some(Self::Discard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total remote calls per evaluation, at least 1.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
    /// Client-side bound on each call.
    pub timeout: Duration,
    pub on_exhausted: ExhaustedPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(400),
            timeout: Duration::from_secs(4),
            on_exhausted: ExhaustedPolicy::MaterialFallback,
        }
    }
}

/// Evaluates positions for the orientation heuristic and the review page.
#[derive(Clone)]
pub struct PositionEvaluator {
    service: Option<Arc<dyn AnalysisService>>,
    policy: RetryPolicy,
}

impl PositionEvaluator {
    pub fn new(service: Arc<dyn AnalysisService>, policy: RetryPolicy) -> Self {
        Self {
            service: Some(service),
            policy,
        }
    }

    /// Evaluator with no remote collaborator: always the material count.
    pub fn material_only() -> Self {
        Self {
            service: None,
            policy: RetryPolicy::default(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Evaluate a position.
    ///
    /// Makes at most `max_attempts` remote calls. A quota signal switches
    /// to the material count at once without further calls.
    pub async fn evaluate(&self, pos: &Chess) -> Result<Evaluation, EvaluateError> {
        let Some(service) = &self.service else {
            return Ok(Evaluation::material(pos));
        };

        let fen = wire_fen(pos);
        let attempts = self.policy.max_attempts.max(1);
        let mut last = AnalysisError::Unavailable("no attempt made".to_string());

        for attempt in 1..=attempts {
            debug!(service = service.name(), attempt, fen = %fen, "Requesting analysis");

            let result = match tokio::time::timeout(self.policy.timeout, service.analyze(&fen)).await
            {
                Ok(result) => result,
                Err(_) => Err(AnalysisError::Timeout(self.policy.timeout)),
            };

            match result {
                Ok(remote) => {
                    info!(
                        service = service.name(),
                        attempt,
                        centipawns = remote.centipawns,
                        "Remote evaluation received"
                    );
                    return Ok(Evaluation {
                        centipawns: remote.centipawns,
                        source: EvalSource::Remote,
                        best_move: remote.best_move,
                    });
                }
                Err(AnalysisError::QuotaExhausted) => {
                    warn!(service = service.name(), "Analysis quota exhausted, using material count");
                    return Ok(Evaluation::material(pos));
                }
                Err(e) => {
                    warn!(
                        service = service.name(),
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Analysis attempt failed"
                    );
                    last = e;
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        match self.policy.on_exhausted {
            ExhaustedPolicy::MaterialFallback => {
                warn!(attempts, "Analysis retries exhausted, using material count");
                Ok(Evaluation::material(pos))
            }
            ExhaustedPolicy::SideToMove | ExhaustedPolicy::Discard => {
                Err(EvaluateError::AnalysisUnavailable { attempts, last })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::position::{parse_fen, STANDARD_START_FEN};

    /// Scripted fake: pops one response per call; `None` hangs forever.
    pub(crate) struct ScriptedAnalysis {
        pub calls: AtomicU32,
        pub seen_fens: Mutex<Vec<String>>,
        script: Mutex<VecDeque<Option<Result<RemoteEvaluation, AnalysisError>>>>,
        repeat: Option<Result<RemoteEvaluation, AnalysisError>>,
    }

    impl ScriptedAnalysis {
        pub(crate) fn new(script: Vec<Option<Result<RemoteEvaluation, AnalysisError>>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                seen_fens: Mutex::new(Vec::new()),
                script: Mutex::new(script.into()),
                repeat: None,
            }
        }

        /// Same response forever (`None` = always hang).
        pub(crate) fn always(response: Option<Result<RemoteEvaluation, AnalysisError>>) -> Self {
            let mut fake = Self::new(Vec::new());
            fake.repeat = response;
            fake
        }

        pub(crate) fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnalysisService for ScriptedAnalysis {
        fn analyze<'a>(
            &'a self,
            fen: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<RemoteEvaluation, AnalysisError>> + Send + 'a>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_fens.lock().unwrap().push(fen.to_string());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.repeat.clone());
            Box::pin(async move {
                match next {
                    Some(result) => result,
                    None => std::future::pending().await,
                }
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    pub(crate) fn remote(cp: i32) -> Option<Result<RemoteEvaluation, AnalysisError>> {
        Some(Ok(RemoteEvaluation {
            centipawns: cp,
            best_move: Some("e2e4".to_string()),
        }))
    }

    fn fast_policy(max_attempts: u32, on_exhausted: ExhaustedPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(300),
            timeout: Duration::from_secs(3),
            on_exhausted,
        }
    }

    fn start() -> Chess {
        parse_fen(STANDARD_START_FEN).unwrap()
    }

    #[tokio::test]
    async fn test_remote_success_first_try() {
        let fake = Arc::new(ScriptedAnalysis::new(vec![remote(35)]));
        let evaluator = PositionEvaluator::new(fake.clone(), fast_policy(5, ExhaustedPolicy::Discard));

        let eval = evaluator.evaluate(&start()).await.unwrap();
        assert_eq!(eval.centipawns, 35);
        assert_eq!(eval.source, EvalSource::Remote);
        assert_eq!(eval.best_move.as_deref(), Some("e2e4"));
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let fake = Arc::new(ScriptedAnalysis::new(vec![
            Some(Err(AnalysisError::Unavailable("503".into()))),
            Some(Err(AnalysisError::MalformedResponse("no eval".into()))),
            remote(-120),
        ]));
        let evaluator = PositionEvaluator::new(fake.clone(), fast_policy(5, ExhaustedPolicy::Discard));

        let eval = evaluator.evaluate(&start()).await.unwrap();
        assert_eq!(eval.centipawns, -120);
        assert_eq!(fake.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_goes_straight_to_material() {
        let fake = Arc::new(ScriptedAnalysis::always(Some(Err(AnalysisError::QuotaExhausted))));
        let evaluator = PositionEvaluator::new(fake.clone(), fast_policy(5, ExhaustedPolicy::Discard));

        let pos = parse_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let eval = evaluator.evaluate(&pos).await.unwrap();
        assert_eq!(eval.source, EvalSource::Material);
        assert_eq!(eval.centipawns, 500);
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_stop_after_exactly_n_attempts() {
        for n in 1..=4 {
            let fake = Arc::new(ScriptedAnalysis::always(None));
            let evaluator =
                PositionEvaluator::new(fake.clone(), fast_policy(n, ExhaustedPolicy::Discard));

            let err = evaluator.evaluate(&start()).await.unwrap_err();
            let EvaluateError::AnalysisUnavailable { attempts, last } = err;
            assert_eq!(attempts, n);
            assert_eq!(last, AnalysisError::Timeout(Duration::from_secs(3)));
            assert_eq!(fake.call_count(), n);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_with_material_fallback() {
        let fake = Arc::new(ScriptedAnalysis::always(None));
        let evaluator =
            PositionEvaluator::new(fake.clone(), fast_policy(3, ExhaustedPolicy::MaterialFallback));

        let eval = evaluator.evaluate(&start()).await.unwrap();
        assert_eq!(eval.source, EvalSource::Material);
        assert_eq!(eval.centipawns, 0);
        assert_eq!(fake.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_wait_is_bounded() {
        let fake = Arc::new(ScriptedAnalysis::always(None));
        let evaluator = PositionEvaluator::new(fake, fast_policy(5, ExhaustedPolicy::Discard));

        let started = tokio::time::Instant::now();
        let _ = evaluator.evaluate(&start()).await;
        // 5 timeouts of 3s plus 4 backoffs of 300ms
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(5 * 3000 + 4 * 300));
        assert!(elapsed < Duration::from_millis(5 * 3000 + 5 * 300));
    }

    #[tokio::test]
    async fn test_wire_fen_sent_without_en_passant() {
        let fake = Arc::new(ScriptedAnalysis::new(vec![remote(0)]));
        let evaluator = PositionEvaluator::new(fake.clone(), fast_policy(1, ExhaustedPolicy::Discard));

        let pos = parse_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
        evaluator.evaluate(&pos).await.unwrap();

        let seen = fake.seen_fens.lock().unwrap();
        assert_eq!(
            seen[0],
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3"
        );
    }

    #[tokio::test]
    async fn test_material_only() {
        let evaluator = PositionEvaluator::material_only();
        let pos = parse_fen("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
        let eval = evaluator.evaluate(&pos).await.unwrap();
        assert_eq!(eval, Evaluation::material(&pos));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(ExhaustedPolicy::parse("material"), Some(ExhaustedPolicy::MaterialFallback));
        assert_eq!(ExhaustedPolicy::parse("Discard"), Some(ExhaustedPolicy::Discard));
        assert_eq!(ExhaustedPolicy::parse("side_to_move"), Some(ExhaustedPolicy::SideToMove));
        assert_eq!(ExhaustedPolicy::parse("maybe"), None);
    }
}
