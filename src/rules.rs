//! Pure rule functions over [`Board`]. None of them mutate their input.

use crate::board::{Board, NUM_SQUARES, bit, rays, squares};
use crate::types::{Player, Position};

/// True iff `pos` is empty and placing `player` there brackets at least one
/// opponent run.
pub fn is_legal_move(board: &Board, pos: Position, player: Player) -> bool {
    flips_for(board, pos, player) != 0
}

/// Mask of discs flipped by `player` playing at `pos`. Zero when illegal.
pub fn flips_for(board: &Board, pos: Position, player: Player) -> u64 {
    let (me, opp) = board.sides(player);
    collect_flips(pos.index(), me, opp)
}

/// Places `player`'s disc at `pos` and flips every bracketed run.
///
/// # Panics
///
/// Panics when the move is not legal. Callers must check with
/// [`is_legal_move`] first.
pub fn resolve_move(board: &Board, pos: Position, player: Player) -> Board {
    resolve_move_with_flips(board, pos, player).0
}

/// [`resolve_move`] that also hands back the flipped mask.
pub(crate) fn resolve_move_with_flips(board: &Board, pos: Position, player: Player) -> (Board, u64) {
    let flips = flips_for(board, pos, player);
    assert!(
        flips != 0,
        "resolve_move called with illegal move {pos:?} for {player:?}"
    );

    let (me, opp) = board.sides(player);
    let mut next = *board;
    next.set_sides(player, me | bit(pos.index()) | flips, opp & !flips);
    (next, flips)
}

/// Returns legal move mask for the given side.
pub fn legal_moves(board: &Board, player: Player) -> u64 {
    let (me, opp) = board.sides(player);
    let empty = !(me | opp);

    squares(empty)
        .filter(|&pos| collect_flips(pos, me, opp) != 0)
        .fold(0u64, |legal, pos| legal | bit(pos))
}

/// Legal moves for `player` in row-major order.
pub fn legal_positions(board: &Board, player: Player) -> Vec<Position> {
    squares(legal_moves(board, player))
        .map(Position::from_index)
        .collect()
}

pub fn has_any_legal_move(board: &Board, player: Player) -> bool {
    legal_moves(board, player) != 0
}

/// Neither side can move. Covers the full board.
pub fn is_terminal(board: &Board) -> bool {
    !has_any_legal_move(board, Player::Black) && !has_any_legal_move(board, Player::White)
}

fn collect_flips(pos: usize, me: u64, opp: u64) -> u64 {
    if pos >= NUM_SQUARES {
        return 0;
    }

    let move_bit = bit(pos);
    if ((me | opp) & move_bit) != 0 {
        return 0;
    }

    let mut flips = 0u64;

    for ray in rays(pos) {
        let mut line = 0u64;

        for &square in ray {
            let square = bit(square as usize);
            if (opp & square) != 0 {
                line |= square;
            } else {
                if (me & square) != 0 {
                    flips |= line;
                }
                break;
            }
        }
    }

    flips
}
