//! Tunable constants for the simulation core.
//!
//! Every field has a built-in default, so a missing or partial `config.ron`
//! still produces a playable configuration.

use crate::errors::{DataError, DataResult};
use schema::MonsterTemplate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Minimum time between two encounter rolls while walking through a zone.
    pub encounter_cooldown_ms: u32,
    /// An encounter fires when a roll in [0, 100) is at least this value.
    pub spawn_chance: u32,
    /// Tint opacity change per second (opacity runs 0..=255).
    pub tint_speed: f32,
    pub startup_delay_ms: u32,
    /// Incoming damage multiplier while the target is defending.
    pub defend_multiplier: f32,
    /// Inclusive percent range applied to base damage before defense.
    pub damage_variance: (u32, u32),
    /// Experience per level of each defeated opponent, split among participants.
    pub exp_per_opponent_level: u32,
    pub evolution_duration_ms: u32,
    /// Player walk speed in pixels per second.
    pub player_speed: f32,
    pub start_world: String,
    pub start_spawn: String,
    pub starting_roster: Vec<MonsterTemplate>,
    pub save_dir: PathBuf,
    pub quick_save_name: String,
    /// Fixed seed for reproducible runs. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Let the AI choose the player's battle actions (headless runs).
    pub auto_battle: bool,
    pub battle_turn_interval_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            encounter_cooldown_ms: 250,
            spawn_chance: 90,
            tint_speed: 600.0,
            startup_delay_ms: 250,
            defend_multiplier: 0.5,
            damage_variance: (90, 110),
            exp_per_opponent_level: 100,
            evolution_duration_ms: 2600,
            player_speed: 250.0,
            start_world: "world".to_string(),
            start_spawn: "start".to_string(),
            starting_roster: vec![
                MonsterTemplate::new("Plumette", 5),
                MonsterTemplate::new("Sparchu", 5),
                MonsterTemplate::new("Finsta", 5),
            ],
            save_dir: PathBuf::from("saves"),
            quick_save_name: format!("sfslotqs{}.json", env!("CARGO_PKG_VERSION")),
            seed: None,
            auto_battle: false,
            battle_turn_interval_ms: 600,
        }
    }
}

impl GameConfig {
    /// Parse a configuration document. Omitted fields keep their defaults.
    pub fn from_ron_str(content: &str, origin: &Path) -> DataResult<Self> {
        ron::from_str(content).map_err(|e| DataError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `config.ron` from the data directory, falling back to defaults
    /// when the file does not exist.
    pub fn load(data_dir: &Path) -> DataResult<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            log::info!("No {} in {}, using defaults", CONFIG_FILE, data_dir.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_ron_str(&content, &path)
    }

    pub fn quick_save_path(&self) -> PathBuf {
        self.save_dir.join(&self.quick_save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            GameConfig::from_ron_str("(spawn_chance: 50, seed: Some(7))", Path::new("inline"))
                .expect("partial config should parse");

        assert_eq!(config.spawn_chance, 50);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.encounter_cooldown_ms, 250);
        assert_eq!(config.starting_roster.len(), 3);
    }

    #[test]
    fn test_bad_config_reports_parse_error() {
        let result = GameConfig::from_ron_str("(spawn_chance: \"lots\")", Path::new("inline"));
        assert!(matches!(result, Err(DataError::Parse { .. })));
    }

    #[test]
    fn test_shipped_config_parses() {
        let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let config = GameConfig::load(&data_dir).expect("shipped config should load");
        assert_eq!(config.spawn_chance, 90);
        assert_eq!(config.start_world, "world");
    }
}
