//! A single puzzle being solved: board, solution cursor, hints, history.
//!
//! Every session owns its own working position, so sessions never share
//! state with each other or with the orientation replay.

use serde::Serialize;
use shakmaty::{Chess, Color, Position};
use tracing::{debug, info};

use crate::error::{TrainerError, UnusablePuzzle};
use crate::evaluator::{Evaluation, PositionEvaluator};
use crate::hints::{HintLadder, HintStep};
use crate::orientation::{prepare_puzzle, reconcile};
use crate::position::{move_to_uci, parse_fen, resolve_uci, side_name, to_fen};
use crate::puzzle::Puzzle;
use crate::replay::{apply_solution_move, replay_to_end};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    #[serde(rename = "move")]
    pub uci: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Not a legal move; nothing changed.
    Illegal { attempted: String },
    /// Legal but not the solution move; the move was taken back.
    Incorrect { played: String },
    Correct {
        played: String,
        /// Opponent reply auto-played from the solution, if any.
        reply: Option<String>,
        solved: bool,
    },
}

#[derive(Debug, Clone)]
pub struct PuzzleSession {
    puzzle: Puzzle,
    position: Chess,
    orientation: Color,
    cursor: usize,
    hints: HintLadder,
    history: Vec<HistoryEntry>,
    evaluation: Option<Evaluation>,
}

impl PuzzleSession {
    /// Parse, pick the solver's side and bring the board to the solver's turn.
    pub async fn prepare(
        puzzle: Puzzle,
        evaluator: &PositionEvaluator,
    ) -> Result<Self, UnusablePuzzle> {
        let start = parse_fen(&puzzle.fen)?;
        let (choice, puzzle_start) = prepare_puzzle(&start, &puzzle.solution, evaluator).await?;

        let mut session = Self {
            puzzle,
            position: puzzle_start.position,
            orientation: puzzle_start.orientation,
            cursor: puzzle_start.cursor,
            hints: HintLadder::default(),
            history: Vec::new(),
            evaluation: choice.evaluation,
        };
        if let Some(auto) = puzzle_start.auto_played {
            session.history.push(HistoryEntry {
                uci: auto,
                correct: true,
            });
        }
        Ok(session)
    }

    /// Session where the caller already knows the solver's side.
    ///
    /// The whole solution is still replayed first, so a broken line is
    /// rejected here rather than in the middle of a solve.
    pub fn with_orientation(puzzle: Puzzle, orientation: Color) -> Result<Self, UnusablePuzzle> {
        if puzzle.solution.is_empty() {
            return Err(UnusablePuzzle::EmptySolution);
        }
        let start = parse_fen(&puzzle.fen)?;
        replay_to_end(&start, &puzzle.solution)?;
        let puzzle_start = reconcile(&start, &puzzle.solution, orientation)?;
        let history = puzzle_start
            .auto_played
            .map(|uci| vec![HistoryEntry { uci, correct: true }])
            .unwrap_or_default();
        Ok(Self {
            puzzle,
            position: puzzle_start.position,
            orientation,
            cursor: puzzle_start.cursor,
            hints: HintLadder::default(),
            history,
            evaluation: None,
        })
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn orientation(&self) -> Color {
        self.orientation
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn is_solved(&self) -> bool {
        self.cursor >= self.puzzle.solution.len()
    }

    pub fn expected_move(&self) -> Option<&str> {
        self.puzzle.solution.get(self.cursor).map(String::as_str)
    }

    /// Check a solver move against the solution.
    pub fn submit_move(&mut self, uci: &str) -> Result<MoveOutcome, TrainerError> {
        if self.is_solved() {
            return Err(TrainerError::AlreadySolved);
        }

        let Some(played) = resolve_uci(&self.position, uci) else {
            debug!(uci, "Illegal move rejected");
            return Ok(MoveOutcome::Illegal {
                attempted: uci.to_string(),
            });
        };
        let played_uci = move_to_uci(&played);

        let expected = self
            .expected_move()
            .and_then(|token| resolve_uci(&self.position, token));
        if expected.as_ref() != Some(&played) {
            self.history.push(HistoryEntry {
                uci: played_uci.clone(),
                correct: false,
            });
            return Ok(MoveOutcome::Incorrect { played: played_uci });
        }

        // Resolve the opponent's answer before touching the session, so a
        // bad reply token leaves the board where it was.
        let mut after = self.position.clone();
        after.play_unchecked(played);
        let reply = match self.puzzle.solution.get(self.cursor + 1) {
            Some(token) => Some(apply_solution_move(&after, self.cursor + 1, token)?),
            None => None,
        };

        self.hints.reset();
        self.position = after;
        self.cursor += 1;
        self.history.push(HistoryEntry {
            uci: played_uci.clone(),
            correct: true,
        });

        let reply = reply.map(|(m, next)| {
            self.position = next;
            self.cursor += 1;
            let reply = move_to_uci(&m);
            self.history.push(HistoryEntry {
                uci: reply.clone(),
                correct: true,
            });
            reply
        });
        let solved = self.is_solved();
        if solved {
            info!(puzzle_id = %self.puzzle.id, "Puzzle solved");
        }

        Ok(MoveOutcome::Correct {
            played: played_uci,
            reply,
            solved,
        })
    }

    /// Next rung of the hint ladder for the expected move.
    pub fn hint(&mut self) -> Option<HintStep> {
        let expected = self.expected_move()?.to_string();
        self.hints.next(&expected)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            puzzle_id: self.puzzle.id.clone(),
            fen: to_fen(&self.position),
            orientation: side_name(self.orientation),
            turn: side_name(self.position.turn()),
            rating: self.puzzle.rating,
            themes: self.puzzle.theme_text(),
            progress: self.cursor,
            total_moves: self.puzzle.solution.len(),
            solved: self.is_solved(),
            evaluation: self.evaluation.clone(),
            history: self.history.clone(),
        }
    }
}

/// Client-facing snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub puzzle_id: String,
    pub fen: String,
    pub orientation: &'static str,
    pub turn: &'static str,
    pub rating: Option<i32>,
    pub themes: String,
    pub progress: usize,
    pub total_moves: usize,
    pub solved: bool,
    pub evaluation: Option<Evaluation>,
    pub history: Vec<HistoryEntry>,
}
