//! Which side the solver plays, and bringing the board to the solver's turn.

use shakmaty::{Chess, Color, Position};
use tracing::{info, warn};

use crate::error::{EvaluateError, UnusablePuzzle};
use crate::evaluator::{Evaluation, ExhaustedPolicy, PositionEvaluator};
use crate::position::{side_name, to_fen};
use crate::replay::{apply_solution_move, replay_to_end};

#[derive(Debug, Clone)]
pub struct OrientationChoice {
    pub orientation: Color,
    pub final_position: Chess,
    /// `None` when analysis was unavailable and the side-to-move default applied.
    pub evaluation: Option<Evaluation>,
}

/// Map a white-positive score to the solver's side.
///
/// Zero or missing scores default to the side to move at puzzle start.
pub fn orientation_from_score(centipawns: Option<i32>, start_turn: Color) -> Color {
    match centipawns {
        Some(cp) if cp > 0 => Color::White,
        Some(cp) if cp < 0 => Color::Black,
        _ => start_turn,
    }
}

/// Replay the solution, evaluate where it ends, and pick the better side.
pub async fn choose_orientation(
    start: &Chess,
    solution: &[String],
    evaluator: &PositionEvaluator,
) -> Result<OrientationChoice, UnusablePuzzle> {
    if solution.is_empty() {
        return Err(UnusablePuzzle::EmptySolution);
    }

    let final_position = replay_to_end(start, solution)?;

    let evaluation = match evaluator.evaluate(&final_position).await {
        Ok(eval) => Some(eval),
        Err(EvaluateError::AnalysisUnavailable { attempts, last }) => {
            match evaluator.policy().on_exhausted {
                ExhaustedPolicy::Discard => {
                    return Err(EvaluateError::AnalysisUnavailable { attempts, last }.into());
                }
                ExhaustedPolicy::SideToMove | ExhaustedPolicy::MaterialFallback => {
                    warn!(attempts, error = %last, "No evaluation, defaulting to side to move");
                    None
                }
            }
        }
    };

    let orientation =
        orientation_from_score(evaluation.as_ref().map(|e| e.centipawns), start.turn());

    info!(
        start_fen = %to_fen(start),
        final_fen = %to_fen(&final_position),
        eval = ?evaluation.as_ref().map(|e| e.centipawns),
        chosen = side_name(orientation),
        side_to_move = side_name(start.turn()),
        first_move = %solution[0],
        "Orientation decided"
    );

    Ok(OrientationChoice {
        orientation,
        final_position,
        evaluation,
    })
}

/// The live puzzle board once the solver is on move.
#[derive(Debug, Clone)]
pub struct PuzzleStart {
    pub orientation: Color,
    pub position: Chess,
    /// Index of the next solution move the solver must find.
    pub cursor: usize,
    /// First solution move, when it was played for the opponent.
    pub auto_played: Option<String>,
}

/// Auto-play the first solution move when the side to move is not the
/// solver's, so the solver always has the move.
pub fn reconcile(
    start: &Chess,
    solution: &[String],
    orientation: Color,
) -> Result<PuzzleStart, UnusablePuzzle> {
    if start.turn() == orientation {
        return Ok(PuzzleStart {
            orientation,
            position: start.clone(),
            cursor: 0,
            auto_played: None,
        });
    }

    let first = solution.first().ok_or(UnusablePuzzle::EmptySolution)?;
    let (_, position) = apply_solution_move(start, 0, first)?;
    if solution.len() < 2 {
        return Err(UnusablePuzzle::NoSolverMoves);
    }

    info!(
        auto_move = %first,
        "Turn mismatch, auto-playing first solution move"
    );
    debug_assert_eq!(position.turn(), orientation);

    Ok(PuzzleStart {
        orientation,
        position,
        cursor: 1,
        auto_played: Some(first.clone()),
    })
}

/// Orientation plus reconciliation in one step.
pub async fn prepare_puzzle(
    start: &Chess,
    solution: &[String],
    evaluator: &PositionEvaluator,
) -> Result<(OrientationChoice, PuzzleStart), UnusablePuzzle> {
    let choice = choose_orientation(start, solution, evaluator).await?;
    let puzzle_start = reconcile(start, solution, choice.orientation)?;
    Ok((choice, puzzle_start))
}
