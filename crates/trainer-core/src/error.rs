//! Trainer error types

use std::time::Duration;

use thiserror::Error;

/// Puzzle record problems. Never retryable: the record itself is broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Invalid solution move {uci} at index {index}")]
    InvalidSolutionMove { index: usize, uci: String },
}

/// Failures talking to the remote analysis service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Analysis unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Analysis quota exhausted")]
    QuotaExhausted,

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Quota exhaustion routes straight to the material fallback; everything
    /// else may be retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AnalysisError::QuotaExhausted)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("Analysis unavailable after {attempts} attempt(s): {last}")]
    AnalysisUnavailable { attempts: u32, last: AnalysisError },
}

/// Why a puzzle was rejected at load time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnusablePuzzle {
    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Evaluation(#[from] EvaluateError),

    #[error("Puzzle has an empty solution")]
    EmptySolution,

    #[error("Nothing left for the solver after the opening reply")]
    NoSolverMoves,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error(transparent)]
    Position(#[from] ReplayError),

    #[error("No legal move leads from the first position to the second")]
    NoConnectingMove,

    #[error(transparent)]
    Evaluation(#[from] EvaluateError),
}

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Puzzle database error: {0}")]
    Database(String),

    #[error("No usable puzzle after {0} draw(s)")]
    NoUsablePuzzle(u32),

    #[error("Puzzle is already solved")]
    AlreadySolved,

    #[error("Run is over")]
    RunOver,

    #[error("No puzzle loaded, restart the run")]
    NoPuzzleLoaded,

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
