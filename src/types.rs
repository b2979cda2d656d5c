use serde::Serialize;

use crate::board::BOARD_SIZE;

/// Cell codes used in board arrays handed to hosts.
pub const CELL_EMPTY: u8 = 0;
pub const CELL_BLACK: u8 = 1;
pub const CELL_WHITE: u8 = 2;

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Returns `None` when the coordinate falls off the board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Square index in `0..64`, row-major.
    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    pub fn from_index(idx: usize) -> Self {
        debug_assert!(idx < BOARD_SIZE * BOARD_SIZE, "square index out of range: {idx}");
        Self {
            row: (idx / BOARD_SIZE) as u8,
            col: (idx % BOARD_SIZE) as u8,
        }
    }
}

/// One side of the game. Black is the human and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub const HUMAN: Player = Player::Black;
    pub const COMPUTER: Player = Player::White;

    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Same encoding as [`CELL_BLACK`] / [`CELL_WHITE`].
    pub fn code(self) -> u8 {
        match self {
            Player::Black => CELL_BLACK,
            Player::White => CELL_WHITE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => CELL_EMPTY,
            Cell::Black => CELL_BLACK,
            Cell::White => CELL_WHITE,
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

/// Turn controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    HumanTurn,
    ComputerTurn,
    GameOver,
}

/// Public game state returned from host-facing APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Vec<u8>,
    pub phase: Phase,
    pub current_player: u8,
    pub black_count: u8,
    pub white_count: u8,
    pub is_game_over: bool,
    /// Contract:
    /// - `true` when the side that just moved moves again because its opponent passed.
    /// - `false` otherwise.
    pub is_pass: bool,
    /// Contract:
    /// - After a move: list of flipped positions (0..=63).
    /// - Fresh game: must be an empty list.
    pub flipped: Vec<u8>,
    /// `None` while no countdown is running.
    pub remaining_seconds: Option<u32>,
}

/// Final result after game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    /// `None` on a draw.
    pub winner: Option<Player>,
    pub black_count: u8,
    pub white_count: u8,
}

impl GameResult {
    pub fn from_counts(black_count: u8, white_count: u8) -> Self {
        let winner = if black_count > white_count {
            Some(Player::Black)
        } else if white_count > black_count {
            Some(Player::White)
        } else {
            None
        };
        Self {
            winner,
            black_count,
            white_count,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}
