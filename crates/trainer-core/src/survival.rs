//! Survival mode: lives, score and a rising rating target.

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::TrainerError;
use crate::evaluator::PositionEvaluator;
use crate::puzzle::{PuzzleDatabase, MAX_RATING};
use crate::session::{MoveOutcome, PuzzleSession, SessionView};

pub const STARTING_LIVES: u32 = 3;
pub const STARTING_TARGET: i32 = 700;
pub const MIN_TARGET_STEP: i32 = 50;
pub const MAX_TARGET_STEP: i32 = 100;
/// Draws per load before giving up on finding a usable puzzle.
pub const MAX_DRAWS: u32 = 10;

/// Counters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurvivalRun {
    pub lives: u32,
    pub score: u32,
    pub target_rating: i32,
    pub streak: u32,
    pub best_streak: u32,
}

impl Default for SurvivalRun {
    fn default() -> Self {
        Self {
            lives: STARTING_LIVES,
            score: 0,
            target_rating: STARTING_TARGET,
            streak: 0,
            best_streak: 0,
        }
    }
}

impl SurvivalRun {
    pub fn is_over(&self) -> bool {
        self.lives == 0
    }

    /// Count a solve and raise the target by 50..=100, capped.
    pub fn record_solve<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.score += 1;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        let step = rng.gen_range(MIN_TARGET_STEP..=MAX_TARGET_STEP);
        self.target_rating = (self.target_rating + step).min(MAX_RATING);
    }

    pub fn record_mistake(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.streak = 0;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivalMoveResult {
    pub outcome: MoveOutcome,
    pub run: SurvivalRun,
    pub game_over: bool,
    /// Set when a solve loaded the next puzzle.
    pub next: Option<SessionView>,
}

/// A run plus the puzzle currently on the board.
#[derive(Debug, Clone, Default)]
pub struct SurvivalGame {
    run: SurvivalRun,
    session: Option<PuzzleSession>,
}

impl SurvivalGame {
    pub fn run(&self) -> &SurvivalRun {
        &self.run
    }

    pub fn session(&self) -> Option<&PuzzleSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut PuzzleSession> {
        self.session.as_mut()
    }

    /// Start over with full lives and the starting target.
    pub async fn restart<R: Rng + Send + ?Sized>(
        &mut self,
        db: &PuzzleDatabase,
        evaluator: &PositionEvaluator,
        rng: &mut R,
    ) -> Result<(), TrainerError> {
        self.run = SurvivalRun::default();
        self.session = None;
        self.load_next(db, evaluator, rng).await
    }

    /// Draw puzzles near the target until one is usable.
    pub async fn load_next<R: Rng + Send + ?Sized>(
        &mut self,
        db: &PuzzleDatabase,
        evaluator: &PositionEvaluator,
        rng: &mut R,
    ) -> Result<(), TrainerError> {
        for draw in 1..=MAX_DRAWS {
            let Some(puzzle) = db.random_in_band(self.run.target_rating, rng) else {
                return Err(TrainerError::Database("puzzle database is empty".to_string()));
            };
            let puzzle_id = puzzle.id.clone();
            match PuzzleSession::prepare(puzzle, evaluator).await {
                Ok(session) => {
                    info!(
                        puzzle_id = %puzzle_id,
                        target = self.run.target_rating,
                        draw,
                        "Survival puzzle loaded"
                    );
                    self.session = Some(session);
                    return Ok(());
                }
                Err(e) => {
                    warn!(puzzle_id = %puzzle_id, error = %e, draw, "Discarding unusable puzzle");
                }
            }
        }
        self.session = None;
        Err(TrainerError::NoUsablePuzzle(MAX_DRAWS))
    }

    /// Play a move on the current puzzle, updating lives and score.
    pub async fn submit_move<R: Rng + Send + ?Sized>(
        &mut self,
        uci: &str,
        db: &PuzzleDatabase,
        evaluator: &PositionEvaluator,
        rng: &mut R,
    ) -> Result<SurvivalMoveResult, TrainerError> {
        if self.run.is_over() {
            return Err(TrainerError::RunOver);
        }
        let session = self.session.as_mut().ok_or(TrainerError::NoPuzzleLoaded)?;

        let outcome = session.submit_move(uci)?;
        let mut next = None;
        match &outcome {
            MoveOutcome::Incorrect { .. } => {
                self.run.record_mistake();
                if self.run.is_over() {
                    info!(score = self.run.score, target = self.run.target_rating, "Survival run over");
                }
            }
            MoveOutcome::Correct { solved: true, .. } => {
                self.run.record_solve(rng);
                // The solve stands even when no next puzzle can be drawn
                match self.load_next(db, evaluator, rng).await {
                    Ok(()) => next = self.session.as_ref().map(PuzzleSession::view),
                    Err(e) => warn!(score = self.run.score, error = %e, "No next survival puzzle"),
                }
            }
            MoveOutcome::Correct { .. } | MoveOutcome::Illegal { .. } => {}
        }

        Ok(SurvivalMoveResult {
            outcome,
            run: self.run.clone(),
            game_over: self.run.is_over(),
            next,
        })
    }
}
