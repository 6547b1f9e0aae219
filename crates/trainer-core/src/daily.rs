//! Lichess daily puzzle: rebuild the puzzle position from the source game.

use regex::Regex;
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Position};
use tracing::debug;

use crate::error::{ReplayError, UnusablePuzzle};
use crate::position::{parse_fen, resolve_san, to_fen};
use crate::puzzle::Puzzle;
use crate::session::PuzzleSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyGame {
    #[serde(default)]
    pub id: String,
    pub pgn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPuzzleInfo {
    pub id: String,
    pub initial_ply: usize,
    pub solution: Vec<String>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// Body of the daily puzzle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPuzzle {
    pub game: DailyGame,
    pub puzzle: DailyPuzzleInfo,
}

/// SAN tokens in game order, skipping move numbers, tags, comments and results.
pub fn extract_san_moves(pgn: &str) -> Result<Vec<String>, ReplayError> {
    let invalid = |e: regex::Error| ReplayError::InvalidPosition(e.to_string());
    let strip = Regex::new(r"\[[^\]]*\]|\{[^}]*\}|\([^)]*\)").map_err(invalid)?;
    let san = Regex::new(r"O-O-O|O-O|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?")
        .map_err(invalid)?;

    let body = strip.replace_all(pgn, " ");
    Ok(san
        .find_iter(&body)
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Position after moves `0..=initial_ply` of the game: the solver is on move.
pub fn daily_start_position(pgn: &str, initial_ply: usize) -> Result<Chess, ReplayError> {
    let moves = extract_san_moves(pgn)?;
    if moves.len() <= initial_ply {
        return Err(ReplayError::InvalidPosition(format!(
            "game has {} plies, puzzle starts after ply {initial_ply}",
            moves.len()
        )));
    }

    let mut pos = Chess::default();
    for (index, san) in moves.iter().take(initial_ply + 1).enumerate() {
        let m = resolve_san(&pos, san).ok_or_else(|| ReplayError::InvalidSolutionMove {
            index,
            uci: san.clone(),
        })?;
        pos.play_unchecked(m);
    }
    debug!(initial_ply, fen = %to_fen(&pos), "Daily position rebuilt");
    Ok(pos)
}

impl DailyPuzzle {
    pub fn to_puzzle(&self) -> Result<Puzzle, ReplayError> {
        let start = daily_start_position(&self.game.pgn, self.puzzle.initial_ply)?;
        Ok(Puzzle {
            id: self.puzzle.id.clone(),
            fen: to_fen(&start),
            solution: self.puzzle.solution.clone(),
            rating: self.puzzle.rating,
            themes: self.puzzle.themes.clone(),
        })
    }

    /// The daily solution always starts with the solver's move, so the side
    /// to move is the solver.
    pub fn into_session(self) -> Result<PuzzleSession, UnusablePuzzle> {
        let puzzle = self.to_puzzle()?;
        let turn = parse_fen(&puzzle.fen)?.turn();
        PuzzleSession::with_orientation(puzzle, turn)
    }
}
