//! FEN / UCI helpers around the shakmaty rules oracle.

use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Move, Position,
};

use crate::error::ReplayError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN into a legal standard-chess position.
pub fn parse_fen(fen: &str) -> Result<Chess, ReplayError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| ReplayError::InvalidPosition(format!("{fen}: {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| ReplayError::InvalidPosition(format!("{fen}: {e}")))
}

pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// FEN copy for the remote analyzer, which rejects an en-passant target.
/// Only the serialised string changes; the position itself is untouched.
pub fn wire_fen(pos: &Chess) -> String {
    strip_en_passant(&to_fen(pos))
}

/// Replace the en-passant field (4th) of a FEN string with `-`.
pub fn strip_en_passant(fen: &str) -> String {
    let mut fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() >= 4 {
        fields[3] = "-";
    }
    fields.join(" ")
}

/// Space separated UCI tokens, as stored in the puzzle database.
pub fn parse_solution(moves: &str) -> Vec<String> {
    moves.split_whitespace().map(str::to_string).collect()
}

/// Resolve a UCI token against a position.
///
/// A pawn move onto the last rank without a promotion suffix is read as a
/// queen promotion, matching what the board offers by default.
pub fn resolve_uci(pos: &Chess, uci: &str) -> Option<Move> {
    let token = uci.trim();
    if let Some(m) = token
        .parse::<UciMove>()
        .ok()
        .and_then(|u| u.to_move(pos).ok())
    {
        return Some(m);
    }
    if token.len() == 4 {
        let promoted = format!("{token}q");
        return promoted
            .parse::<UciMove>()
            .ok()
            .and_then(|u| u.to_move(pos).ok());
    }
    None
}

/// Canonical UCI text for a legal move (`e1g1` style castling).
pub fn move_to_uci(m: &Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}

pub fn move_to_san(pos: &Chess, m: &Move) -> String {
    San::from_move(pos, m.clone()).to_string()
}

/// Parse a SAN token against a position.
pub fn resolve_san(pos: &Chess, san: &str) -> Option<Move> {
    let parsed: San = san.trim().parse().ok()?;
    parsed.to_move(pos).ok()
}

pub fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

pub fn parse_side(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}
