//! Match and grid configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of players in a match
pub const PLAYER_COUNT: usize = 2;

/// Grid generation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Hexes in an even row (odd rows are one narrower)
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Chance that an eligible tile becomes a roadblock
    pub roadblock_chance: f32,
    /// Hex corner radius in world units
    pub hex_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 9,
            height: 8,
            roadblock_chance: 0.1,
            hex_size: 1.0,
        }
    }
}

impl GridConfig {
    /// Open grid with no roadblocks
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            roadblock_chance: 0.0,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..=1.0).contains(&self.roadblock_chance) {
            return Err(ConfigError::RoadblockChance(self.roadblock_chance));
        }
        if self.hex_size <= 0.0 {
            return Err(ConfigError::HexSize(self.hex_size));
        }
        Ok(())
    }
}

/// Match configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub grid: GridConfig,
    /// Units per player, further capped by roster data
    pub max_army_size: usize,
    /// Rows from each player's edge where units may be placed
    pub max_spawn_distance: usize,
    /// Seconds between game over and match teardown
    pub game_over_delay: f32,
    /// Seconds between the last placement and the first battle turn
    pub battle_start_delay: f32,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Player that opens every turn (None = drawn from the seeded rng)
    pub first_player: Option<usize>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            max_army_size: 5,
            max_spawn_distance: 2,
            game_over_delay: 1.0,
            battle_start_delay: 0.0,
            seed: None,
            first_player: None,
        }
    }
}

impl MatchConfig {
    /// Set grid settings
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the opening player
    pub fn with_first_player(mut self, player: usize) -> Self {
        self.first_player = Some(player);
        self
    }

    pub fn with_army_size(mut self, size: usize) -> Self {
        self.max_army_size = size;
        self
    }

    pub fn with_game_over_delay(mut self, seconds: f32) -> Self {
        self.game_over_delay = seconds;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        if !(1..=10).contains(&self.max_army_size) {
            return Err(ConfigError::ArmySize(self.max_army_size));
        }
        if !(1..=3).contains(&self.max_spawn_distance) {
            return Err(ConfigError::SpawnDistance(self.max_spawn_distance));
        }
        if let Some(first) = self.first_player {
            if first >= PLAYER_COUNT {
                return Err(ConfigError::FirstPlayer {
                    first,
                    players: PLAYER_COUNT,
                });
            }
        }
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read match config: {}", path.display()))?;
        let config: MatchConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse match config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = MatchConfig::default().with_army_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ArmySize(0)));

        let config = MatchConfig::default().with_first_player(2);
        assert!(matches!(config.validate(), Err(ConfigError::FirstPlayer { .. })));

        let config = MatchConfig::default().with_grid(GridConfig::open(1, 5));
        assert!(matches!(config.validate(), Err(ConfigError::GridTooSmall { .. })));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MatchConfig =
            serde_json::from_str(r#"{ "grid": { "width": 5 }, "seed": 7 }"#).unwrap();
        assert_eq!(config.grid.width, 5);
        assert_eq!(config.grid.height, GridConfig::default().height);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_army_size, 5);
    }
}
