/// Material fallback evaluation: fixed piece weights, white positive.

use shakmaty::{Chess, Color, Position, Role};

pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;

/// Centipawn-like scale applied to the piece weights.
pub const CENTIPAWNS_PER_PAWN: i32 = 100;

pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => 0,
    }
}

/// Signed material balance in centipawns (white minus black).
pub fn material_balance(pos: &Chess) -> i32 {
    let board = pos.board();
    let mut score = 0i32;
    for sq in board.occupied() {
        if let Some(piece) = board.piece_at(sq) {
            let value = piece_value(piece.role) * CENTIPAWNS_PER_PAWN;
            match piece.color {
                Color::White => score += value,
                Color::Black => score -= value,
            }
        }
    }
    score
}
