//! Solution replay on a private copy of the game state.

use shakmaty::{Chess, Move, Position};

use crate::error::ReplayError;
use crate::position::resolve_uci;

/// Play one solution token, returning the legal move and the new position.
pub fn apply_solution_move(
    pos: &Chess,
    index: usize,
    uci: &str,
) -> Result<(Move, Chess), ReplayError> {
    let invalid = || ReplayError::InvalidSolutionMove {
        index,
        uci: uci.to_string(),
    };
    let m = resolve_uci(pos, uci).ok_or_else(invalid)?;
    let next = pos.clone().play(m.clone()).map_err(|_| invalid())?;
    Ok((m, next))
}

/// Replay the whole solution from `start` and return the final position.
///
/// `start` is never modified; every illegal token is a corrupt record.
pub fn replay_to_end(start: &Chess, solution: &[String]) -> Result<Chess, ReplayError> {
    let mut working = start.clone();
    for (index, uci) in solution.iter().enumerate() {
        let (_, next) = apply_solution_move(&working, index, uci)?;
        working = next;
    }
    Ok(working)
}
