pub mod daily;
pub mod error;
pub mod evaluator;
pub mod high_score;
pub mod hints;
pub mod material;
pub mod orientation;
pub mod position;
pub mod puzzle;
pub mod replay;
pub mod review;
pub mod session;
pub mod survival;

pub use error::{AnalysisError, EvaluateError, ReplayError, ReviewError, TrainerError, UnusablePuzzle};
pub use evaluator::{
    AnalysisService, EvalSource, Evaluation, ExhaustedPolicy, PositionEvaluator, RemoteEvaluation,
    RetryPolicy,
};
pub use orientation::{choose_orientation, prepare_puzzle, reconcile, OrientationChoice, PuzzleStart};
pub use puzzle::{Puzzle, PuzzleDatabase, PuzzleRecord};
pub use session::{MoveOutcome, PuzzleSession, SessionView};
pub use survival::{SurvivalGame, SurvivalRun};
