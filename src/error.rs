use thiserror::Error;

/// Why a human move request was not applied. The session state is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejected {
    #[error("game is already over")]
    GameOver,
    #[error("it is not the player's turn")]
    NotHumanTurn,
    #[error("row/col out of range: ({row}, {col})")]
    OutOfBounds { row: u8, col: u8 },
    #[error("illegal move at ({row}, {col})")]
    IllegalMove { row: u8, col: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown difficulty: {0:?} (expected easy, medium or hard)")]
    UnknownDifficulty(String),
    #[error("invalid game config: {0}")]
    Invalid(String),
}
