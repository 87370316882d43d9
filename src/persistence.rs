//! Save files.
//!
//! A save is one JSON document with four sections: the world and roster,
//! the player entity, the NPCs on the current map and the global NPC
//! progress book. Energy and max stats are never stored; they are rebuilt
//! from species and level on load.

use crate::data::GameData;
use crate::errors::{SaveError, SaveResult};
use crate::monster::MonsterRecord;
use crate::roster::Roster;
use crate::world::character::CharacterBook;
use crate::world::map::Direction;
use crate::world::player::PlayerRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub current_world: String,
    pub player_monsters: Vec<MonsterRecord>,
}

/// Runtime state of one NPC on the saved map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub character_id: String,
    pub facing: Direction,
    pub defeated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub game_data: GameSnapshot,
    pub player: PlayerRecord,
    pub characters: Vec<CharacterRecord>,
    pub character_data: CharacterBook,
}

impl SaveData {
    /// Rebuild the roster. Unknown species or abilities make the save malformed.
    pub fn restore_roster(&self, data: &GameData) -> SaveResult<Roster> {
        for record in &self.game_data.player_monsters {
            for ability in record.abilities.values() {
                data.ability(ability)
                    .map_err(|e| SaveError::MalformedSave(e.to_string()))?;
            }
        }
        Roster::from_records(data, &self.game_data.player_monsters)
            .map_err(|e| SaveError::MalformedSave(e.to_string()))
    }

    /// Check every reference into the static tables and build the roster
    pub fn validate(&self, data: &GameData) -> SaveResult<Roster> {
        data.world(&self.game_data.current_world)
            .map_err(|e| SaveError::MalformedSave(e.to_string()))?;
        if let Some(unknown) = self
            .character_data
            .keys()
            .find(|id| data.character(id).is_err())
        {
            return Err(SaveError::MalformedSave(format!("unknown character '{}'", unknown)));
        }
        self.restore_roster(data)
    }
}

pub fn to_json(save: &SaveData) -> SaveResult<String> {
    serde_json::to_string_pretty(save).map_err(|e| SaveError::MalformedSave(e.to_string()))
}

pub fn from_json(content: &str) -> SaveResult<SaveData> {
    serde_json::from_str(content).map_err(|e| SaveError::MalformedSave(e.to_string()))
}

/// Write a save, creating the save directory when needed
pub fn write_save(path: &Path, save: &SaveData) -> SaveResult<()> {
    let content = to_json(save)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| SaveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved game to {}", path.display());
    Ok(())
}

pub fn read_save(path: &Path) -> SaveResult<SaveData> {
    let content = fs::read_to_string(path).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&content)
}
