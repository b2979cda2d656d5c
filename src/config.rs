use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_COMPUTER_DELAY_MS: u64 = 1000;

/// Selection policy for the computer side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    #[serde(alias = "normal")]
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub difficulty: Difficulty,
    /// Per-turn limit for the human. `0` disables the countdown.
    pub time_limit_secs: u32,
    /// Pause before the computer plays, so the host can show the last move.
    pub computer_delay_ms: u64,
    /// Fixed RNG seed. `None` seeds from the platform entropy source.
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn new(difficulty: Difficulty, time_limit_secs: u32) -> Self {
        Self {
            difficulty,
            time_limit_secs,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn computer_delay(&self) -> Duration {
        Duration::from_millis(self.computer_delay_ms)
    }

    pub fn has_countdown(&self) -> bool {
        self.time_limit_secs > 0
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            time_limit_secs: 0,
            computer_delay_ms: DEFAULT_COMPUTER_DELAY_MS,
            seed: None,
        }
    }
}
