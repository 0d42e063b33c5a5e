//! Tunable simulation parameters.
//! This module exists so balance knobs live in one serde-backed struct loadable from TOML.
//! It does not own per-kind monster data, which stays in `content`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_LOS_RANGE: i32 = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Radius of the player's field of view before status modifiers.
    pub los_range: i32,
    pub player_max_hp: i32,
    /// Flat damage dealt by a bump attack.
    pub player_attack: i32,
    pub move_delay: i32,
    /// Turns of uninterrupted rest needed to recover.
    pub rest_turns: i32,
    pub band_radius: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            los_range: DEFAULT_LOS_RANGE,
            player_max_hp: 40,
            player_attack: 8,
            move_delay: 10,
            rest_turns: 15,
            band_radius: 4,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("los_range", self.los_range),
            ("player_max_hp", self.player_max_hp),
            ("player_attack", self.player_attack),
            ("move_delay", self.move_delay),
            ("rest_turns", self.rest_turns),
            ("band_radius", self.band_radius),
        ];
        for (field, value) in fields {
            if value <= 0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}
