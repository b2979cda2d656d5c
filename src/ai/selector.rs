use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::Serialize;

use crate::ai::positional::evaluate;
use crate::board::Board;
use crate::config::Difficulty;
use crate::rules::legal_positions;
use crate::types::{Player, Position};

const MEDIUM_POOL: usize = 3;

/// A legal move with its static score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub pos: Position,
    pub score: i32,
}

pub trait MoveSelector: Send + Sync {
    fn select_move(
        &self,
        board: &Board,
        player: Player,
        difficulty: Difficulty,
        rng: &mut dyn RngCore,
    ) -> Option<Position>;
}

/// Scores legal moves with the positional table and picks by difficulty.
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionalSelector;

impl MoveSelector for PositionalSelector {
    fn select_move(
        &self,
        board: &Board,
        player: Player,
        difficulty: Difficulty,
        rng: &mut dyn RngCore,
    ) -> Option<Position> {
        let candidates = enumerate_candidates(board, player);
        select_candidate(difficulty, &candidates, rng).map(|candidate| candidate.pos)
    }
}

/// Every legal move for `player`, row-major.
pub fn enumerate_candidates(board: &Board, player: Player) -> Vec<Candidate> {
    legal_positions(board, player)
        .into_iter()
        .map(|pos| Candidate {
            pos,
            score: evaluate(pos),
        })
        .collect()
}

/// Returns `None` only for an empty candidate list.
pub fn select_candidate<R: Rng + ?Sized>(
    difficulty: Difficulty,
    candidates: &[Candidate],
    rng: &mut R,
) -> Option<Candidate> {
    match difficulty {
        Difficulty::Easy => candidates.choose(rng).copied(),
        Difficulty::Medium => {
            let mut ranked = candidates.to_vec();
            // Stable, so equal scores keep enumeration order.
            ranked.sort_by(|left, right| right.score.cmp(&left.score));
            let pool = ranked.len().min(MEDIUM_POOL);
            ranked[..pool].choose(rng).copied()
        }
        Difficulty::Hard => candidates
            .iter()
            .copied()
            .reduce(|best, candidate| {
                if candidate.score > best.score {
                    candidate
                } else {
                    best
                }
            }),
    }
}
