pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod rules;
pub mod scheduler;
pub mod types;
pub mod wasm;

pub use board::Board;
pub use config::{Difficulty, GameConfig};
pub use error::{ConfigError, MoveRejected};
pub use game::{GameEvent, GameSession};
pub use scheduler::{ManualScheduler, Scheduler, Task, TaskHandle};
pub use types::{Cell, GameResult, GameState, Phase, Player, Position};
