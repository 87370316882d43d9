//! A module for defining AI behaviors for battle participants.

use crate::battle::engine::{calculate_damage, get_valid_actions};
use crate::battle::state::{BattlePhase, BattleSession, PlayerAction, PLAYER_SIDE};
use crate::data::GameData;
use crate::errors::{BattleError, BattleResult};
use ordered_float::OrderedFloat;
use schema::{ElementType, StatKind};

/// A trait for any system that can decide on a battle action.
/// This provides a common interface for different AI difficulties or strategies.
pub trait Behavior {
    /// Inspects the battle state and decides on the next action for the given side.
    fn decide_action(&self, side: usize, session: &BattleSession, data: &GameData) -> PlayerAction;
}

/// Health fraction below which healing is worth more than attacking
const HEAL_THRESHOLD: f32 = 0.5;
/// Baseline for bracing when nothing better is available
const DEFEND_SCORE: f32 = 0.5;

pub struct ScoringAI;

impl ScoringAI {
    pub fn new() -> Self {
        Self
    }

    /// The core scoring logic. Assigns a floating-point value to a given action.
    fn score_action(&self, action: &PlayerAction, side: usize, session: &BattleSession, data: &GameData) -> f32 {
        match action {
            PlayerAction::Attack { ability } => self.score_ability(ability, side, session, data).unwrap_or(-1.0),
            PlayerAction::Defend => DEFEND_SCORE,
            PlayerAction::Switch { slot } => self.score_switch(*slot, side, session),
            PlayerAction::Flee => -1000.0, // Never run unless it's the only option.
        }
    }

    /// Expected damage for attacks, restored health for heals
    fn score_ability(&self, ability_id: &str, side: usize, session: &BattleSession, data: &GameData) -> BattleResult<f32> {
        let ability = data
            .ability(ability_id)
            .map_err(|_| BattleError::UnknownAbility(ability_id.to_string()))?;
        let attacker = session.sides[side]
            .active_monster()
            .ok_or(BattleError::NoActiveMonster(side))?;
        let base_damage = attacker.get_base_damage(ability);

        if ability.is_healing() {
            let (health, max_health) = attacker.get_info().0;
            if (health as f32) >= max_health as f32 * HEAL_THRESHOLD {
                return Ok(-1.0);
            }
            let missing = (max_health - health) as f32;
            return Ok((-base_damage).min(missing));
        }

        let defender = match session.sides[1 - side].active_monster() {
            Some(monster) => monster,
            None => return Ok(0.0), // Cannot score if there is no target.
        };
        let effectiveness = ElementType::effectiveness(ability.element, defender.element);
        let damage = calculate_damage(
            base_damage,
            defender.get_stat(StatKind::Defense),
            effectiveness,
            false,
            1.0,
        );
        Ok(damage as f32)
    }

    /// Only used for replacements: prefer element advantage, then remaining health
    fn score_switch(&self, slot: usize, side: usize, session: &BattleSession) -> f32 {
        let Some(candidate) = session.sides[side].roster.get(slot) else {
            return -1.0;
        };
        let advantage = session.sides[1 - side]
            .active_monster()
            .map_or(1.0, |opponent| ElementType::effectiveness(candidate.element, opponent.element));
        let (health, max_health) = candidate.get_info().0;
        advantage * 100.0 + health as f32 / max_health.max(1) as f32
    }
}

impl Default for ScoringAI {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for ScoringAI {
    fn decide_action(&self, side: usize, session: &BattleSession, data: &GameData) -> PlayerAction {
        let valid_actions = get_valid_actions(session, data, side);

        // --- Phase 1: Forced replacement ---
        if session.phase == BattlePhase::AwaitingReplacement && side == PLAYER_SIDE {
            return valid_actions
                .into_iter()
                .max_by_key(|action| OrderedFloat(self.score_action(action, side, session, data)))
                .unwrap_or(PlayerAction::Defend);
        }

        // --- Phase 2: Attack or brace ---
        // Voluntary switching and fleeing are left to humans.
        valid_actions
            .into_iter()
            .filter(|action| matches!(action, PlayerAction::Attack { .. } | PlayerAction::Defend))
            .map(|action| {
                let score = self.score_action(&action, side, session, data);
                (action, score)
            })
            .max_by_key(|(_, score)| OrderedFloat(*score))
            .map(|(action, _)| action)
            .unwrap_or(PlayerAction::Defend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::{Controller, OPPONENT_SIDE};
    use crate::monster::Monster;
    use crate::roster::Roster;
    use pretty_assertions::assert_eq;

    fn session(data: &GameData, player: Vec<Monster>, wild: Vec<Monster>) -> BattleSession {
        BattleSession::wild(
            Roster::from_monsters(player),
            Roster::from_monsters(wild),
            "forest",
            Controller::Ai,
        )
        .unwrap()
    }

    #[test]
    fn test_low_level_monster_scratches() {
        let data = GameData::bundled().unwrap();
        let session = session(
            &data,
            vec![Monster::new(&data, "Sparchu", 5).unwrap()],
            vec![Monster::new(&data, "Larvea", 5).unwrap()],
        );
        // One point of energy: only the free ability is affordable
        let action = ScoringAI::new().decide_action(PLAYER_SIDE, &session, &data);
        assert_eq!(
            action,
            PlayerAction::Attack {
                ability: "scratch".to_string()
            }
        );
    }

    #[test]
    fn test_prefers_super_effective_ability() {
        let data = GameData::bundled().unwrap();
        let session = session(
            &data,
            vec![Monster::new(&data, "Sparchu", 30).unwrap()],
            vec![Monster::new(&data, "Plumette", 30).unwrap()],
        );
        let action = ScoringAI::new().decide_action(PLAYER_SIDE, &session, &data);
        assert_eq!(
            action,
            PlayerAction::Attack {
                ability: "fire".to_string()
            }
        );
    }

    #[test]
    fn test_replacement_picks_element_advantage() {
        let data = GameData::bundled().unwrap();
        let mut session = session(
            &data,
            vec![
                Monster::new(&data, "Plumette", 5).unwrap(),
                Monster::new(&data, "Pouch", 5).unwrap(),
                Monster::new(&data, "Finsta", 5).unwrap(),
            ],
            vec![Monster::new(&data, "Sparchu", 5).unwrap()],
        );
        session.sides[PLAYER_SIDE].active_monster_mut().unwrap().take_damage(10_000);
        session.phase = BattlePhase::AwaitingReplacement;

        let action = ScoringAI::new().decide_action(PLAYER_SIDE, &session, &data);
        assert_eq!(action, PlayerAction::Switch { slot: 2 });
        assert_eq!(session.sides[OPPONENT_SIDE].active, 0);
    }
}
