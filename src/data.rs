//! The immutable static-data registry.
//!
//! Species, abilities, NPC characters and maps are parsed once at startup and
//! shared read-only (usually behind an `Arc`) by everything that needs a lookup.

use crate::errors::{DataError, DataResult};
use crate::world::character::CharacterData;
use crate::world::map::WorldMap;
use schema::{AbilityData, SpeciesData};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

pub const SPECIES_FILE: &str = "species.ron";
pub const ABILITIES_FILE: &str = "abilities.ron";
pub const CHARACTERS_FILE: &str = "characters.ron";
pub const WORLDS_FILE: &str = "worlds.ron";

// Tables compiled into the binary so the core runs without a data directory.
const BUNDLED_SPECIES: &str = include_str!("../data/species.ron");
const BUNDLED_ABILITIES: &str = include_str!("../data/abilities.ron");
const BUNDLED_CHARACTERS: &str = include_str!("../data/characters.ron");
const BUNDLED_WORLDS: &str = include_str!("../data/worlds.ron");

#[derive(Debug, Clone)]
pub struct GameData {
    species: HashMap<String, SpeciesData>,
    abilities: HashMap<String, AbilityData>,
    characters: BTreeMap<String, CharacterData>,
    worlds: HashMap<String, WorldMap>,
}

fn parse_table<T: DeserializeOwned>(content: &str, origin: &Path) -> DataResult<T> {
    ron::from_str(content).map_err(|e| DataError::Parse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_table<T: DeserializeOwned>(data_dir: &Path, file: &str) -> DataResult<T> {
    let path = data_dir.join(file);
    let content = fs::read_to_string(&path).map_err(|source| DataError::Io {
        path: path.clone(),
        source,
    })?;
    parse_table(&content, &path)
}

impl GameData {
    /// Load every table from RON files in the data directory
    pub fn load(data_dir: &Path) -> DataResult<Self> {
        let data = Self {
            species: read_table(data_dir, SPECIES_FILE)?,
            abilities: read_table(data_dir, ABILITIES_FILE)?,
            characters: read_table(data_dir, CHARACTERS_FILE)?,
            worlds: read_table(data_dir, WORLDS_FILE)?,
        };
        data.validate()?;
        log::info!(
            "Loaded {} species, {} abilities, {} characters, {} maps from {}",
            data.species.len(),
            data.abilities.len(),
            data.characters.len(),
            data.worlds.len(),
            data_dir.display()
        );
        Ok(data)
    }

    /// Load the tables compiled into the crate
    pub fn bundled() -> DataResult<Self> {
        Self::from_ron_strs(
            BUNDLED_SPECIES,
            BUNDLED_ABILITIES,
            BUNDLED_CHARACTERS,
            BUNDLED_WORLDS,
        )
    }

    /// Build a registry from in-memory RON documents
    pub fn from_ron_strs(
        species: &str,
        abilities: &str,
        characters: &str,
        worlds: &str,
    ) -> DataResult<Self> {
        let data = Self {
            species: parse_table(species, &PathBuf::from(SPECIES_FILE))?,
            abilities: parse_table(abilities, &PathBuf::from(ABILITIES_FILE))?,
            characters: parse_table(characters, &PathBuf::from(CHARACTERS_FILE))?,
            worlds: parse_table(worlds, &PathBuf::from(WORLDS_FILE))?,
        };
        data.validate()?;
        Ok(data)
    }

    /// Cross-check every key that one table uses to refer into another.
    /// A dangling reference is fatal: it would otherwise surface mid-game.
    fn validate(&self) -> DataResult<()> {
        for species in self.species.values() {
            for ability in species.abilities.values() {
                self.ability(ability)?;
            }
            if let Some(evolution) = &species.evolution {
                self.species(&evolution.target)?;
            }
        }

        for character in self.characters.values() {
            for template in &character.monsters {
                self.species(&template.name)?;
            }
        }

        for (name, map) in &self.worlds {
            for zone in &map.encounter_zones {
                for species in &zone.monsters {
                    self.species(species)?;
                }
            }
            for placement in &map.characters {
                self.character(&placement.character_id)?;
            }
            for transition in &map.transitions {
                let target = self.world(&transition.target)?;
                target.spawn(&transition.target, &transition.spawn)?;
            }
            log::debug!("Map '{}' validated", name);
        }

        for character in self.characters.values() {
            if let Some(spawn) = &character.checkpoint {
                let has_spawn = self.worlds.values().any(|map| map.spawns.contains_key(spawn));
                if !has_spawn {
                    return Err(DataError::UnknownSpawn {
                        map: "*".to_string(),
                        spawn: spawn.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn species(&self, name: &str) -> DataResult<&SpeciesData> {
        self.species
            .get(name)
            .ok_or_else(|| DataError::InvalidSpecies(name.to_string()))
    }

    pub fn ability(&self, id: &str) -> DataResult<&AbilityData> {
        self.abilities
            .get(id)
            .ok_or_else(|| DataError::UnknownAbility(id.to_string()))
    }

    pub fn character(&self, id: &str) -> DataResult<&CharacterData> {
        self.characters
            .get(id)
            .ok_or_else(|| DataError::UnknownCharacter(id.to_string()))
    }

    pub fn world(&self, name: &str) -> DataResult<&WorldMap> {
        self.worlds
            .get(name)
            .ok_or_else(|| DataError::UnknownMap(name.to_string()))
    }

    pub fn characters(&self) -> &BTreeMap<String, CharacterData> {
        &self.characters
    }

    /// Species names in sorted order
    pub fn species_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.species.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
