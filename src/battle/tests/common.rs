use crate::battle::engine::{resolve_turn, BattleRules};
use crate::battle::state::{BattleSession, Controller, EventBus, TurnRng};
use crate::data::GameData;
use crate::errors::BattleResult;
use crate::monster::Monster;
use crate::roster::Roster;
use std::sync::{Arc, OnceLock};

/// The bundled tables, parsed once and shared by every battle test.
pub fn test_data() -> Arc<GameData> {
    static DATA: OnceLock<Arc<GameData>> = OnceLock::new();
    DATA.get_or_init(|| match GameData::bundled() {
        Ok(data) => Arc::new(data),
        Err(err) => panic!("Failed to load bundled data: {}", err),
    })
    .clone()
}

/// A builder for creating test monsters with common defaults.
///
/// # Example
/// ```ignore
/// let sparchu = TestMonsterBuilder::new("Sparchu", 5).with_health(10).build();
/// ```
pub struct TestMonsterBuilder {
    name: String,
    level: u32,
    health: Option<u32>,
    energy: Option<u32>,
}

impl TestMonsterBuilder {
    /// Creates a new builder for a given species and level.
    pub fn new(name: &str, level: u32) -> Self {
        Self {
            name: name.to_string(),
            level,
            health: None,
            energy: None,
        }
    }

    /// Sets the current health. If not set, health will be max.
    pub fn with_health(mut self, health: u32) -> Self {
        self.health = Some(health);
        self
    }

    /// Sets the current energy. If not set, energy will be max.
    pub fn with_energy(mut self, energy: u32) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn build(self) -> Monster {
        let mut monster = match Monster::new(&test_data(), &self.name, self.level) {
            Ok(monster) => monster,
            Err(err) => panic!("Failed to create {}: {}", self.name, err),
        };
        if let Some(health) = self.health {
            monster.health = health;
        }
        if let Some(energy) = self.energy {
            monster.energy = energy;
        }
        monster.stat_limiter();
        monster
    }
}

/// Creates a wild battle with a human-driven player side.
pub fn create_test_battle(player: Vec<Monster>, wild: Vec<Monster>) -> BattleSession {
    assert_ok(BattleSession::wild(
        Roster::from_monsters(player),
        Roster::from_monsters(wild),
        "forest",
        Controller::Human,
    ))
}

/// Creates a trainer battle against the given character id.
pub fn create_trainer_battle(player: Vec<Monster>, trainer: Vec<Monster>) -> BattleSession {
    assert_ok(BattleSession::trainer(
        Roster::from_monsters(player),
        "o1",
        Roster::from_monsters(trainer),
        "forest",
        Controller::Human,
    ))
}

/// Every variance roll lands on exactly 100 percent.
pub fn predictable_rng() -> TurnRng {
    TurnRng::new_for_test(vec![100; 100])
}

/// Resolve the queued actions with default rules, panicking on error.
pub fn resolve(session: &mut BattleSession, rng: &mut TurnRng) -> EventBus {
    assert_ok(resolve_turn(session, &test_data(), &BattleRules::default(), rng))
}

/// Helper function to assert that a Result is Ok and return the value.
/// Provides clear error messages in tests when functions unexpectedly fail.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
