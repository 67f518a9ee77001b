//! Per-game settings

use crate::game::{OutputMode, VerbosityLevel};
use serde::{Deserialize, Serialize};

/// Settings for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub starting_life: i32,
    /// Cards in the opening hand
    pub opening_hand_size: usize,
    /// Hand size enforced in cleanup
    pub max_hand_size: usize,
    /// Turns (counting both players) before the game is called a draw
    pub max_turns: u32,
    /// Seed for library shuffles
    pub seed: u64,
    pub verbosity: VerbosityLevel,
    pub output_mode: OutputMode,
    /// Actions one player may take in a single priority window before
    /// being made to pass
    pub max_actions_per_window: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_life: 20,
            opening_hand_size: 7,
            max_hand_size: 7,
            max_turns: 60,
            seed: 0,
            verbosity: VerbosityLevel::Normal,
            output_mode: OutputMode::Memory,
            max_actions_per_window: 200,
        }
    }
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn with_starting_life(mut self, life: i32) -> Self {
        self.starting_life = life;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.opening_hand_size, 7);
        assert_eq!(config.max_turns, 60);
        assert_eq!(config.output_mode, OutputMode::Memory);
    }

    #[test]
    fn test_builder_and_json() {
        let config = GameConfig::default()
            .with_seed(42)
            .with_max_turns(10)
            .with_verbosity(VerbosityLevel::Silent);
        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.seed, 42);
    }
}
