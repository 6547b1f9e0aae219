/// Move review: quality labels, eval bar and played-move recovery
/// (pure functions plus one async evaluation helper)

use serde::Serialize;
use shakmaty::{Chess, Position};

use crate::error::ReviewError;
use crate::evaluator::{Evaluation, PositionEvaluator};
use crate::position::{move_to_san, move_to_uci, parse_fen, to_fen};

/// Quality thresholds (absolute centipawn difference)
const THRESHOLD_BEST: i32 = 25;
const THRESHOLD_EXCELLENT: i32 = 50;
const THRESHOLD_GOOD: i32 = 100;
const THRESHOLD_INACCURACY: i32 = 200;
const THRESHOLD_MISTAKE: i32 = 400;

/// At or beyond this the bar is pinned
const EVAL_BAR_PIN: i32 = 1000;
const EVAL_BAR_CP_PER_PERCENT: f64 = 40.0;
const EVAL_BAR_MIN: f64 = 5.0;
const EVAL_BAR_MAX: f64 = 95.0;

/// Mate detection threshold
const MATE_THRESHOLD: i32 = 9000;

/// Maximum CP loss to cap at
const MAX_CP_LOSS: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveQuality {
    pub fn symbol(self) -> &'static str {
        match self {
            MoveQuality::Best => "‼️",
            MoveQuality::Excellent => "!",
            MoveQuality::Good => "",
            MoveQuality::Inaccuracy => "?!",
            MoveQuality::Mistake => "?",
            MoveQuality::Blunder => "??",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoveQuality::Best => "Best Move",
            MoveQuality::Excellent => "Excellent",
            MoveQuality::Good => "Good Move",
            MoveQuality::Inaccuracy => "Inaccuracy",
            MoveQuality::Mistake => "Mistake",
            MoveQuality::Blunder => "Blunder",
        }
    }
}

pub fn classify_move(played_eval: i32, best_eval: i32) -> MoveQuality {
    let diff = (played_eval - best_eval).abs();
    if diff < THRESHOLD_BEST {
        MoveQuality::Best
    } else if diff < THRESHOLD_EXCELLENT {
        MoveQuality::Excellent
    } else if diff < THRESHOLD_GOOD {
        MoveQuality::Good
    } else if diff < THRESHOLD_INACCURACY {
        MoveQuality::Inaccuracy
    } else if diff < THRESHOLD_MISTAKE {
        MoveQuality::Mistake
    } else {
        MoveQuality::Blunder
    }
}

fn is_mate_score(eval: i32) -> bool {
    eval.abs() > MATE_THRESHOLD
}

/// Centipawns the mover gave up, from the mover's side, capped.
pub fn calculate_cp_loss(best_eval: i32, after_eval: i32, is_white: bool) -> i32 {
    if is_mate_score(best_eval) && is_mate_score(after_eval) {
        return if (best_eval > 0) == (after_eval > 0) {
            0
        } else {
            MAX_CP_LOSS
        };
    }

    let cp_loss = if is_white {
        best_eval - after_eval
    } else {
        after_eval - best_eval
    };
    cp_loss.clamp(0, MAX_CP_LOSS)
}

/// White's share of the evaluation bar, in percent.
pub fn eval_bar_percentage(centipawns: i32) -> f64 {
    if centipawns.abs() >= EVAL_BAR_PIN {
        return if centipawns > 0 { EVAL_BAR_MAX } else { EVAL_BAR_MIN };
    }
    (50.0 + f64::from(centipawns) / EVAL_BAR_CP_PER_PERCENT).clamp(EVAL_BAR_MIN, EVAL_BAR_MAX)
}

/// Placement, side to move and castling rights; clocks and en passant ignored.
fn same_position(a: &str, b: &str) -> bool {
    a.split_whitespace().take(3).eq(b.split_whitespace().take(3))
}

/// The legal move leading from `before` to `after`, as (uci, san).
pub fn find_played_move(before: &Chess, after_fen: &str) -> Option<(String, String)> {
    before.legal_moves().into_iter().find_map(|m| {
        let mut next = before.clone();
        next.play_unchecked(m.clone());
        same_position(&to_fen(&next), after_fen).then(|| (move_to_uci(&m), move_to_san(before, &m)))
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveReview {
    pub uci: String,
    pub san: String,
    pub best_eval: Evaluation,
    pub played_eval: Evaluation,
    pub cp_loss: i32,
    pub quality: MoveQuality,
    pub symbol: &'static str,
    pub label: &'static str,
    pub eval_bar: f64,
}

/// Evaluate both sides of a move and grade it.
pub async fn review_move(
    before_fen: &str,
    after_fen: &str,
    evaluator: &PositionEvaluator,
) -> Result<MoveReview, ReviewError> {
    let before = parse_fen(before_fen)?;
    let after = parse_fen(after_fen)?;
    let (uci, san) = find_played_move(&before, after_fen).ok_or(ReviewError::NoConnectingMove)?;

    let best_eval = evaluator.evaluate(&before).await?;
    let played_eval = evaluator.evaluate(&after).await?;
    let is_white = before.turn().is_white();
    let quality = classify_move(played_eval.centipawns, best_eval.centipawns);

    Ok(MoveReview {
        uci,
        san,
        cp_loss: calculate_cp_loss(best_eval.centipawns, played_eval.centipawns, is_white),
        quality,
        symbol: quality.symbol(),
        label: quality.label(),
        eval_bar: eval_bar_percentage(played_eval.centipawns),
        best_eval,
        played_eval,
    })
}
