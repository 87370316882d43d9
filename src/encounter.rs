//! Random wild encounters while walking through encounter zones.

use crate::config::GameConfig;
use crate::data::GameData;
use crate::errors::DataResult;
use crate::monster::Monster;
use crate::roster::Roster;
use crate::timer::Timer;
use crate::world::map::{EncounterZone, Rect, WorldMap};
use rand::Rng;

/// Most monsters a single wild encounter can field
pub const MAX_WILD_MONSTERS: usize = 3;

/// A wild encounter that just fired
#[derive(Debug, Clone)]
pub struct Encounter {
    pub zone: EncounterZone,
    pub roster: Roster,
}

/// Rolls for wild encounters. At most one roll happens per cooldown window,
/// and only while the player is moving inside an encounter zone.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterController {
    cooldown: Timer,
    spawn_chance: u32,
}

impl EncounterController {
    pub fn new(cooldown_ms: u32, spawn_chance: u32) -> Self {
        Self {
            cooldown: Timer::new(cooldown_ms),
            spawn_chance,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.encounter_cooldown_ms, config.spawn_chance)
    }

    pub fn spawn_chance(&self) -> u32 {
        self.spawn_chance
    }

    pub fn cooling_down(&self) -> bool {
        self.cooldown.is_active()
    }

    /// Advance the cooldown by `dt` seconds
    pub fn update_timer(&mut self, dt: f32) {
        self.cooldown.update(dt);
    }

    /// An encounter fires when the roll meets the threshold
    pub fn roll_fires(&self, roll: u32) -> bool {
        roll >= self.spawn_chance
    }

    /// Check the player's hitbox against the map's encounter zones.
    ///
    /// Leaving every zone, standing still or being in a battle resets the
    /// cooldown so the next step into a zone rolls right away.
    pub fn check<R: Rng>(
        &mut self,
        data: &GameData,
        map: &WorldMap,
        hitbox: &Rect,
        moving: bool,
        in_battle: bool,
        rng: &mut R,
    ) -> DataResult<Option<Encounter>> {
        let zone = match map.encounter_zone_at(hitbox) {
            Some(zone) if moving && !in_battle => zone,
            _ => {
                self.cooldown.deactivate();
                return Ok(None);
            }
        };

        if self.cooldown.is_active() {
            return Ok(None);
        }
        self.cooldown.activate();

        let roll = rng.random_range(0..100);
        log::trace!("Encounter roll {} against {}", roll, self.spawn_chance);
        if !self.roll_fires(roll) {
            return Ok(None);
        }

        let roster = generate_wild_roster(data, zone, rng)?;
        log::info!(
            "Wild encounter in {}: {}",
            zone.biome,
            roster
                .iter()
                .map(|(_, monster)| monster.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Some(Encounter {
            zone: zone.clone(),
            roster,
        }))
    }
}

/// Build 1..=3 wild monsters. Species and level are drawn independently
/// for each one from the zone's pool and level range.
pub fn generate_wild_roster<R: Rng>(data: &GameData, zone: &EncounterZone, rng: &mut R) -> DataResult<Roster> {
    let mut roster = Roster::new();
    if zone.monsters.is_empty() {
        log::warn!("Encounter zone in {} has no species", zone.biome);
        return Ok(roster);
    }

    let amount = rng.random_range(1..=MAX_WILD_MONSTERS);
    let (low, high) = (zone.min_level, zone.max_level.max(zone.min_level));
    for _ in 0..amount {
        let species = &zone.monsters[rng.random_range(0..zone.monsters.len())];
        let level = rng.random_range(low..=high);
        roster.push(Monster::new(data, species, level)?);
    }
    Ok(roster)
}
