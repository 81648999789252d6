use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::error::{Error, Result};

/// Goal name that ends the game instead of loading another level.
pub const END_GOAL: &str = "END";

/// Game settings, loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub world: WorldConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    /// Level name (as known to the level source) → its exits.
    #[serde(default)]
    pub levels: BTreeMap<String, LevelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Downward acceleration in pixels/s².
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Level the game starts (and restarts) on.
    pub start: String,
    #[serde(default = "default_block_size")]
    pub block_size: f32,
    /// Length of one simulation tick in seconds.
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub character: String,
    /// Spawn point (body centre) in pixels.
    pub x: f32,
    pub y: f32,
    pub mass: f32,
    /// Maximum (and starting) health.
    pub health: f32,
    /// Walking speed; jumps and bounces are multiples of it.
    pub max_velocity: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            character: "mario".to_string(),
            x: 30.0,
            y: 30.0,
            mass: 100.0,
            health: 20.0,
            max_velocity: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level loaded when the flag is reached, or [`END_GOAL`].
    pub goal: String,
    /// Level entered by ducking on a tunnel.
    #[serde(default)]
    pub tunnel: Option<String>,
}

fn default_gravity() -> f32 {
    300.0
}

fn default_block_size() -> f32 {
    16.0
}

fn default_fixed_dt() -> f32 {
    0.01
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

impl GameConfig {
    /// Parse a config from a JSON string. The result is not validated.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn level(&self, name: &str) -> Result<&LevelConfig> {
        self.levels
            .get(name)
            .ok_or_else(|| Error::UnknownLevel(name.to_string()))
    }

    /// Check the level graph and the numeric settings.
    pub fn validate(&self) -> Result<()> {
        positive("block_size", self.world.block_size)?;
        positive("fixed_dt", self.world.fixed_dt)?;
        positive("player health", self.player.health)?;
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if !self.levels.contains_key(&self.world.start) {
            return invalid(format!("start level {:?} is not listed under levels", self.world.start));
        }
        for (name, level) in &self.levels {
            if level.goal != END_GOAL && !self.levels.contains_key(&level.goal) {
                return invalid(format!("level {name:?} has unknown goal {:?}", level.goal));
            }
            if let Some(tunnel) = &level.tunnel {
                if !self.levels.contains_key(tunnel) {
                    return invalid(format!("level {name:?} has unknown tunnel {tunnel:?}"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "world": { "start": "level1.txt", "gravity": 400 },
        "player": { "character": "luigi", "x": 10, "y": 20, "mass": 80, "health": 5, "max_velocity": 120 },
        "levels": {
            "level1.txt": { "goal": "level2.txt", "tunnel": "bonus.txt" },
            "level2.txt": { "goal": "END" },
            "bonus.txt": { "goal": "level2.txt" }
        }
    }"#;

    #[test]
    fn parse_full_config() {
        let config = GameConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.world.gravity, 400.0);
        assert_eq!(config.world.block_size, 16.0);
        assert_eq!(config.world.fixed_dt, 0.01);
        assert_eq!(config.player.character, "luigi");
        assert_eq!(config.player.max_velocity, 120.0);
        assert_eq!(
            config.level("level1.txt").unwrap().tunnel.as_deref(),
            Some("bonus.txt")
        );
        config.validate().unwrap();
    }

    #[test]
    fn player_section_is_optional() {
        let config = GameConfig::from_json(
            r#"{ "world": { "start": "a" }, "levels": { "a": { "goal": "END" } } }"#,
        )
        .unwrap();
        assert_eq!(config.player, PlayerConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn dangling_level_names_are_rejected() {
        let mut config = GameConfig::from_json(CONFIG).unwrap();
        config.levels.get_mut("level2.txt").unwrap().goal = "nowhere.txt".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = GameConfig::from_json(CONFIG).unwrap();
        config.world.start = "missing.txt".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(matches!(config.level("missing.txt"), Err(Error::UnknownLevel(_))));
    }

    #[test]
    fn non_positive_numbers_are_rejected() {
        let mut config = GameConfig::from_json(CONFIG).unwrap();
        config.world.fixed_dt = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(GameConfig::from_json("{"), Err(Error::Json(_))));
    }
}
