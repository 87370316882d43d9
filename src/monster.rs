use crate::data::GameData;
use crate::errors::{DataResult, MonsterError};
use schema::{AbilityData, AbilitySchedule, BaseStats, ElementType, EvolutionData, SpeciesData, StatKind};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_LEVEL: u32 = 100;

/// Experience needed to leave `level`.
pub fn level_up_threshold(level: u32) -> u32 {
    level * level * 150
}

/// The persisted shape of a monster. Energy and stat maxima are not stored;
/// they are recomputed from `name` + `level` when loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub abilities: AbilitySchedule,
    pub exp: u32,
}

/// Current stat values at the monster's level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterStats {
    pub health: u32,
    pub energy: u32,
    pub attack: u32,
    pub power: u32,
    pub defense: u32,
    pub speed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    pub name: String, // Key into the species table
    pub level: u32,
    pub element: ElementType,
    base_stats: BaseStats,

    pub health: u32,
    pub energy: u32,
    pub abilities: AbilitySchedule, // unlock level -> ability id
    pub defending: bool,           // Only meaningful during the current battle turn

    pub exp: u32,
    pub level_up: u32, // Experience needed for the next level
    pub evolution: Option<EvolutionData>,
}

impl Monster {
    /// Create a monster of the given species at full health and energy
    pub fn new(data: &GameData, name: &str, level: u32) -> DataResult<Self> {
        let species = data.species(name)?;
        Ok(Self::from_species(name, species, level))
    }

    /// Create a monster from an already looked-up species record
    pub fn from_species(name: &str, species: &SpeciesData, level: u32) -> Self {
        let level = level.clamp(1, MAX_LEVEL);
        let mut monster = Monster {
            name: name.to_string(),
            level,
            element: species.element,
            base_stats: species.stats.clone(),
            health: 0,
            energy: 0,
            abilities: species.abilities.clone(),
            defending: false,
            exp: 0,
            level_up: level_up_threshold(level),
            evolution: species.evolution.clone(),
        };
        monster.health = monster.get_stat(StatKind::MaxHealth);
        monster.energy = monster.get_stat(StatKind::MaxEnergy);
        monster
    }

    // --- Stats ---

    /// Base stat scaled by level. Energy capacity scales per ten levels and
    /// never drops below one.
    pub fn get_stat(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::MaxEnergy => (self.base_stats.max_energy * (self.level / 10)).max(1),
            _ => self.base_stats.get(stat) * self.level,
        }
    }

    pub fn get_stats(&self) -> MonsterStats {
        MonsterStats {
            health: self.get_stat(StatKind::MaxHealth),
            energy: self.get_stat(StatKind::MaxEnergy),
            attack: self.get_stat(StatKind::Attack),
            power: self.get_stat(StatKind::Power),
            defense: self.get_stat(StatKind::Defense),
            speed: self.get_stat(StatKind::Speed),
        }
    }

    /// ((health, max_health), (energy, max_energy))
    pub fn get_info(&self) -> ((u32, u32), (u32, u32)) {
        (
            (self.health, self.get_stat(StatKind::MaxHealth)),
            (self.energy, self.get_stat(StatKind::MaxEnergy)),
        )
    }

    /// Raw damage before defense, element and variance are applied
    pub fn get_base_damage(&self, ability: &AbilityData) -> f32 {
        self.get_stat(StatKind::Attack) as f32 * ability.amount
    }

    /// Clamp health and energy into [0, max]. Idempotent.
    pub fn stat_limiter(&mut self) {
        self.health = self.health.min(self.get_stat(StatKind::MaxHealth));
        self.energy = self.energy.min(self.get_stat(StatKind::MaxEnergy));
    }

    // --- Abilities ---

    /// Ability ids unlocked at the current level, in unlock order
    pub fn get_abilities(&self) -> Vec<&str> {
        self.abilities
            .range(..=self.level)
            .map(|(_, ability)| ability.as_str())
            .collect()
    }

    pub fn has_unlocked(&self, ability: &str) -> bool {
        self.get_abilities().contains(&ability)
    }

    pub fn can_afford(&self, ability: &AbilityData) -> bool {
        self.energy >= ability.cost
    }

    /// Pay the energy cost of an ability. Rejects the spend without touching
    /// energy when the monster cannot afford it.
    pub fn reduce_energy(&mut self, ability_id: &str, ability: &AbilityData) -> Result<(), MonsterError> {
        if !self.can_afford(ability) {
            return Err(MonsterError::InsufficientEnergy {
                ability: ability_id.to_string(),
                required: ability.cost,
                available: self.energy,
            });
        }
        self.energy -= ability.cost;
        self.stat_limiter();
        Ok(())
    }

    /// Check that an ability can be used right now: unlocked and affordable
    pub fn check_ability(&self, ability_id: &str, ability: &AbilityData) -> Result<(), MonsterError> {
        if !self.has_unlocked(ability_id) {
            return Err(MonsterError::AbilityLocked {
                ability: ability_id.to_string(),
                level: self.level,
            });
        }
        if !self.can_afford(ability) {
            return Err(MonsterError::InsufficientEnergy {
                ability: ability_id.to_string(),
                required: ability.cost,
                available: self.energy,
            });
        }
        Ok(())
    }

    // --- Health ---

    /// Apply damage and return whether the monster fainted
    pub fn take_damage(&mut self, damage: u32) -> bool {
        self.health = self.health.saturating_sub(damage);
        self.stat_limiter();
        self.is_fainted()
    }

    /// Restore health up to the maximum. Fainted monsters stay fainted.
    pub fn restore_health(&mut self, amount: u32) -> u32 {
        if self.is_fainted() {
            return 0;
        }
        let before = self.health;
        self.health = self.health.saturating_add(amount);
        self.stat_limiter();
        self.health - before
    }

    /// Full restore of health and energy
    pub fn heal(&mut self) {
        self.health = self.get_stat(StatKind::MaxHealth);
        self.energy = self.get_stat(StatKind::MaxEnergy);
        self.defending = false;
    }

    pub fn is_fainted(&self) -> bool {
        self.health == 0
    }

    // --- Experience ---

    /// Add experience. Returns true if the monster gained a level.
    ///
    /// At most one level is gained per call: any overflow beyond the new
    /// level's threshold is kept in `exp` and only converts into another level
    /// on the next award.
    pub fn update_exp(&mut self, amount: u32) -> bool {
        if self.level >= MAX_LEVEL {
            return false;
        }

        let remaining = self.level_up.saturating_sub(self.exp);
        if remaining > amount {
            self.exp += amount;
            false
        } else {
            self.level += 1;
            let carried = u64::from(self.exp) + u64::from(amount) - u64::from(self.level_up);
            self.exp = u32::try_from(carried).unwrap_or(u32::MAX);
            self.level_up = level_up_threshold(self.level);
            log::debug!("{} grew to level {}", self.name, self.level);
            true
        }
    }

    /// The evolution this monster qualifies for at its current level, if any
    pub fn evolution_due(&self) -> Option<&EvolutionData> {
        self.evolution
            .as_ref()
            .filter(|evolution| self.level >= evolution.level)
    }

    // --- Save/load ---

    pub fn to_record(&self) -> MonsterRecord {
        MonsterRecord {
            name: self.name.clone(),
            level: self.level,
            health: self.health,
            abilities: self.abilities.clone(),
            exp: self.exp,
        }
    }

    /// Overwrite the persisted fields from a record, then re-establish the
    /// stat invariants. Energy is left at whatever the instance already had.
    pub fn apply_record(&mut self, record: &MonsterRecord) {
        self.name = record.name.clone();
        self.level = record.level.clamp(1, MAX_LEVEL);
        self.health = record.health;
        self.abilities = record.abilities.clone();
        self.exp = record.exp;
        self.level_up = level_up_threshold(self.level);
        self.stat_limiter();
    }

    /// Rebuild a monster from a record: a fresh instance of the species at the
    /// recorded level, with the persisted fields applied on top.
    pub fn from_record(data: &GameData, record: &MonsterRecord) -> DataResult<Self> {
        let mut monster = Self::new(data, &record.name, record.level)?;
        monster.apply_record(record);
        Ok(monster)
    }
}

impl fmt::Display for Monster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at level {}", self.name, self.level)
    }
}
