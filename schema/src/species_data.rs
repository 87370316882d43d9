use crate::ElementType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter};

/// Ability unlock schedule: level -> ability id learned at that level.
pub type AbilitySchedule = BTreeMap<u32, String>;

/// The six stats every species defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatKind {
    MaxHealth,
    MaxEnergy,
    Attack,
    Power,
    Defense,
    Speed,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::MaxHealth,
        StatKind::MaxEnergy,
        StatKind::Attack,
        StatKind::Power,
        StatKind::Defense,
        StatKind::Speed,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_health: u32,
    pub max_energy: u32,
    pub attack: u32,
    pub power: u32,
    pub defense: u32,
    pub speed: u32,
}

impl BaseStats {
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::MaxHealth => self.max_health,
            StatKind::MaxEnergy => self.max_energy,
            StatKind::Attack => self.attack,
            StatKind::Power => self.power,
            StatKind::Defense => self.defense,
            StatKind::Speed => self.speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionData {
    pub target: String, // Species name
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub element: ElementType,
    pub stats: BaseStats,
    pub abilities: AbilitySchedule,
    #[serde(default)]
    pub evolution: Option<EvolutionData>,
}

/// A species + level pair used by starting rosters and NPC teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub name: String,
    pub level: u32,
}

impl MonsterTemplate {
    pub fn new(name: &str, level: u32) -> Self {
        Self {
            name: name.to_string(),
            level,
        }
    }
}
