use crate::types::Position;

/// Static square weights: corners are prized, the squares that give corners
/// away are penalized.
pub const WEIGHTS: [[i32; 8]; 8] = [
    [100, -20, 10, 5, 5, 10, -20, 100],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [100, -20, 10, 5, 5, 10, -20, 100],
];

/// Positional score of playing at `pos`. Ignores the resulting position.
pub fn evaluate(pos: Position) -> i32 {
    WEIGHTS[pos.row as usize][pos.col as usize]
}
