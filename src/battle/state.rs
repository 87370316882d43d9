use crate::errors::{BattleError, BattleResult};
use crate::monster::Monster;
use crate::progression::ParticipationTracker;
use crate::roster::Roster;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

pub const PLAYER_SIDE: usize = 0;
pub const OPPONENT_SIDE: usize = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Copy)]
pub enum BattlePhase {
    SelectingAction,
    ResolvingTurn,
    AwaitingReplacement, // The player's active monster fainted and a bench monster must come in
    Victory,
    Defeat,
    Fled,
}

impl BattlePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat | BattlePhase::Fled)
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self {
            BattlePhase::Victory => Some(BattleOutcome::Victory),
            BattlePhase::Defeat => Some(BattleOutcome::Defeat),
            BattlePhase::Fled => Some(BattleOutcome::Fled),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Fled,
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BattleOutcome::Victory => "victory",
            BattleOutcome::Defeat => "defeat",
            BattleOutcome::Fled => "fled",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum BattleKind {
    Wild,
    Trainer { character_id: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    // Ability id from the active monster's unlocked abilities
    Attack { ability: String },

    Defend,

    // Roster slot of a healthy bench monster
    Switch { slot: usize },

    Flee,
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::Attack { ability } => write!(f, "attack with {}", ability),
            PlayerAction::Defend => write!(f, "defend"),
            PlayerAction::Switch { slot } => write!(f, "switch to slot {}", slot),
            PlayerAction::Flee => write!(f, "flee"),
        }
    }
}

/// Who picks a side's actions
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Human,
    Ai,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleSide {
    pub name: String,
    pub controller: Controller,
    pub roster: Roster,
    pub active: usize, // Roster slot of the monster on the field
}

impl BattleSide {
    pub fn new(name: &str, controller: Controller, roster: Roster, side_index: usize) -> BattleResult<Self> {
        let active = roster
            .first_healthy()
            .ok_or(BattleError::EmptyRoster(side_index))?;
        Ok(Self {
            name: name.to_string(),
            controller,
            roster,
            active,
        })
    }

    pub fn active_monster(&self) -> Option<&Monster> {
        self.roster.get(self.active)
    }

    pub fn active_monster_mut(&mut self) -> Option<&mut Monster> {
        self.roster.get_mut(self.active)
    }

    /// Healthy monsters that are not on the field, in slot order
    pub fn bench(&self) -> Vec<usize> {
        self.roster
            .healthy_slots()
            .into_iter()
            .filter(|slot| *slot != self.active)
            .collect()
    }

    pub fn is_defeated(&self) -> bool {
        self.roster.all_fainted()
    }

    pub fn switch_to(&mut self, slot: usize) -> BattleResult<()> {
        match self.roster.get(slot) {
            Some(monster) if !monster.is_fainted() && slot != self.active => {
                self.active = slot;
                Ok(())
            }
            _ => Err(BattleError::InvalidSwitchTarget(slot)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded,

    // Actions
    AbilityUsed {
        side: usize,
        monster: String,
        ability: String,
        energy_left: u32,
    },
    Defending {
        side: usize,
        monster: String,
    },
    MonsterSwitched {
        side: usize,
        old_monster: String,
        new_monster: String,
    },
    ActionSkipped {
        side: usize,
        monster: String,
    },
    Fled {
        side: usize,
    },

    // Damage and Healing
    DamageDealt {
        side: usize, // Side of the monster taking damage
        target: String,
        damage: u32,
        remaining_health: u32,
        effectiveness: f32,
    },
    MonsterHealed {
        side: usize,
        target: String,
        amount: u32,
    },
    MonsterFainted {
        side: usize,
        monster: String,
    },
    ReplacementNeeded {
        side: usize,
    },

    // Progression
    ExperienceGained {
        slot: usize,
        monster: String,
        amount: u32,
    },
    LevelUp {
        slot: usize,
        monster: String,
        new_level: u32,
    },
    EvolutionReady {
        slot: usize,
        monster: String,
        target: String,
    },

    // Battle End
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, session: &BattleSession) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => Some(format!("=== Turn {} ===", turn_number)),
            BattleEvent::TurnEnded => None,

            BattleEvent::AbilityUsed {
                side,
                monster,
                ability,
                ..
            } => Some(format!(
                "{} used {}!",
                session.monster_label(*side, monster),
                ability
            )),
            BattleEvent::Defending { side, monster } => Some(format!(
                "{} braces itself!",
                session.monster_label(*side, monster)
            )),
            BattleEvent::MonsterSwitched {
                side,
                old_monster,
                new_monster,
            } => Some(format!(
                "{} recalled {} and sent out {}!",
                session.sides[*side].name, old_monster, new_monster
            )),
            BattleEvent::ActionSkipped { .. } => None,
            BattleEvent::Fled { .. } => Some("Got away safely!".to_string()),

            BattleEvent::DamageDealt {
                side,
                target,
                damage,
                effectiveness,
                ..
            } => {
                let mut text = format!("{} took {} damage!", session.monster_label(*side, target), damage);
                if *effectiveness > 1.0 {
                    text.push_str(" It's super effective!");
                } else if *effectiveness < 1.0 {
                    text.push_str(" It's not very effective...");
                }
                Some(text)
            }
            BattleEvent::MonsterHealed { side, target, amount } => Some(format!(
                "{} recovered {} health!",
                session.monster_label(*side, target),
                amount
            )),
            BattleEvent::MonsterFainted { side, monster } => Some(format!(
                "{} fainted!",
                session.monster_label(*side, monster)
            )),
            BattleEvent::ReplacementNeeded { .. } => Some("Choose the next monster!".to_string()),

            BattleEvent::ExperienceGained { monster, amount, .. } => {
                Some(format!("{} gained {} experience!", monster, amount))
            }
            BattleEvent::LevelUp { monster, new_level, .. } => {
                Some(format!("{} grew to level {}!", monster, new_level))
            }
            BattleEvent::EvolutionReady { monster, target, .. } => {
                Some(format!("{} is ready to evolve into {}!", monster, target))
            }

            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::Victory => Some("You won the battle!".to_string()),
                BattleOutcome::Defeat => Some("All your monsters fainted...".to_string()),
                BattleOutcome::Fled => None,
            },
        }
    }
}

/// Event bus for collecting the events of one resolved turn.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Human-readable lines for every event that has one
    pub fn formatted(&self, session: &BattleSession) -> Vec<String> {
        self.events.iter().filter_map(|event| event.format(session)).collect()
    }

    /// Send the formatted narration to the log at debug level
    pub fn log_formatted(&self, session: &BattleSession) {
        for line in self.formatted(session) {
            log::debug!("  {}", line);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Source of the damage variance rolls. Seeded for reproducible battles,
/// scripted for tests that pin exact damage values.
#[derive(Debug, Clone)]
pub enum TurnRng {
    Seeded(StdRng),
    Scripted { outcomes: Vec<u32>, index: usize },
}

impl TurnRng {
    pub fn from_seed(seed: u64) -> Self {
        TurnRng::Seeded(StdRng::seed_from_u64(seed))
    }

    pub fn new_random() -> Self {
        TurnRng::Seeded(StdRng::from_os_rng())
    }

    pub fn new_for_test(outcomes: Vec<u32>) -> Self {
        TurnRng::Scripted { outcomes, index: 0 }
    }

    /// Next percent roll within `range`. Scripted values outside the range are
    /// clamped into it; an exhausted script keeps returning 100.
    pub fn next_percent(&mut self, reason: &str, range: RangeInclusive<u32>) -> u32 {
        let (low, high) = (*range.start(), *range.end());
        let outcome = match self {
            TurnRng::Seeded(rng) => rng.random_range(range),
            TurnRng::Scripted { outcomes, index } => {
                let value = match outcomes.get(*index) {
                    Some(value) => *value,
                    None => {
                        log::warn!("Scripted rolls exhausted at '{}', using 100", reason);
                        100
                    }
                };
                *index += 1;
                value.clamp(low, high.max(low))
            }
        };
        log::trace!("[RNG] Consumed {} for: {}", outcome, reason);
        outcome
    }
}

/// One running battle. Owns both rosters while it lasts; the player's roster
/// is handed back through `into_player_roster` when the battle is over.
#[derive(Debug, Clone)]
pub struct BattleSession {
    pub kind: BattleKind,
    pub biome: String,
    pub sides: [BattleSide; 2],
    pub turn_number: u32,
    pub phase: BattlePhase,
    pub action_queue: [Option<PlayerAction>; 2],
    pub participation: ParticipationTracker,
    /// Player slots that crossed their evolution level during this battle
    pub pending_evolutions: Vec<usize>,
}

impl BattleSession {
    pub fn new(kind: BattleKind, biome: &str, player: BattleSide, opponent: BattleSide) -> Self {
        let mut participation = ParticipationTracker::new();
        participation.record(player.active);
        Self {
            kind,
            biome: biome.to_string(),
            sides: [player, opponent],
            turn_number: 1,
            phase: BattlePhase::SelectingAction,
            action_queue: [None, None],
            participation,
            pending_evolutions: Vec::new(),
        }
    }

    /// A wild encounter: the opponent side is always AI-driven and may be fled from
    pub fn wild(player_roster: Roster, wild: Roster, biome: &str, player_controller: Controller) -> BattleResult<Self> {
        let player = BattleSide::new("You", player_controller, player_roster, PLAYER_SIDE)?;
        let opponent = BattleSide::new("Wild", Controller::Ai, wild, OPPONENT_SIDE)?;
        log::info!("Wild battle started in {}", biome);
        Ok(Self::new(BattleKind::Wild, biome, player, opponent))
    }

    pub fn trainer(
        player_roster: Roster,
        character_id: &str,
        trainer_roster: Roster,
        biome: &str,
        player_controller: Controller,
    ) -> BattleResult<Self> {
        let player = BattleSide::new("You", player_controller, player_roster, PLAYER_SIDE)?;
        let opponent = BattleSide::new(character_id, Controller::Ai, trainer_roster, OPPONENT_SIDE)?;
        log::info!("Trainer battle against {} started", character_id);
        Ok(Self::new(
            BattleKind::Trainer {
                character_id: character_id.to_string(),
            },
            biome,
            player,
            opponent,
        ))
    }

    pub fn player(&self) -> &BattleSide {
        &self.sides[PLAYER_SIDE]
    }

    pub fn opponent(&self) -> &BattleSide {
        &self.sides[OPPONENT_SIDE]
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.phase.outcome()
    }

    pub fn can_flee(&self) -> bool {
        self.kind == BattleKind::Wild
    }

    pub fn into_player_roster(self) -> Roster {
        let [player, _] = self.sides;
        player.roster
    }

    fn monster_label(&self, side: usize, monster: &str) -> String {
        match (&self.kind, side) {
            (_, PLAYER_SIDE) => monster.to_string(),
            (BattleKind::Wild, _) => format!("Wild {}", monster),
            (BattleKind::Trainer { character_id }, _) => format!("{}'s {}", character_id, monster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameData;
    use pretty_assertions::assert_eq;

    fn roster(data: &GameData, monsters: &[(&str, u32)]) -> Roster {
        Roster::from_monsters(
            monsters
                .iter()
                .map(|(name, level)| Monster::new(data, name, *level).unwrap()),
        )
    }

    #[test]
    fn test_side_starts_with_first_healthy_monster() {
        let data = GameData::bundled().unwrap();
        let mut team = roster(&data, &[("Plumette", 5), ("Sparchu", 5)]);
        team.get_mut(0).unwrap().take_damage(10_000);

        let side = BattleSide::new("You", Controller::Human, team, PLAYER_SIDE).unwrap();
        assert_eq!(side.active, 1);
        assert!(side.bench().is_empty());
    }

    #[test]
    fn test_fully_fainted_roster_cannot_battle() {
        let data = GameData::bundled().unwrap();
        let mut team = roster(&data, &[("Plumette", 5)]);
        team.get_mut(0).unwrap().take_damage(10_000);

        let result = BattleSide::new("You", Controller::Human, team, PLAYER_SIDE);
        assert_eq!(result.unwrap_err(), BattleError::EmptyRoster(PLAYER_SIDE));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = TurnRng::from_seed(42);
        let mut b = TurnRng::from_seed(42);
        for _ in 0..20 {
            let roll = a.next_percent("test", 90..=110);
            assert!((90..=110).contains(&roll));
            assert_eq!(roll, b.next_percent("test", 90..=110));
        }
    }

    #[test]
    fn test_scripted_rng_clamps_and_runs_out() {
        let mut rng = TurnRng::new_for_test(vec![95, 500]);
        assert_eq!(rng.next_percent("a", 90..=110), 95);
        assert_eq!(rng.next_percent("b", 90..=110), 110);
        assert_eq!(rng.next_percent("c", 90..=110), 100);
    }

    #[test]
    fn test_event_formatting_uses_side_labels() {
        let data = GameData::bundled().unwrap();
        let session = BattleSession::wild(
            roster(&data, &[("Plumette", 5)]),
            roster(&data, &[("Sparchu", 4)]),
            "forest",
            Controller::Human,
        )
        .unwrap();

        let event = BattleEvent::MonsterFainted {
            side: OPPONENT_SIDE,
            monster: "Sparchu".to_string(),
        };
        assert_eq!(event.format(&session), Some("Wild Sparchu fainted!".to_string()));
        assert_eq!(BattleEvent::TurnEnded.format(&session), None);
    }
}
