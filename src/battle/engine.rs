use crate::battle::ai::{Behavior, ScoringAI};
use crate::battle::state::{
    BattleEvent, BattleOutcome, BattlePhase, BattleSession, Controller, EventBus, PlayerAction,
    TurnRng, OPPONENT_SIDE, PLAYER_SIDE,
};
use crate::config::GameConfig;
use crate::data::GameData;
use crate::errors::{BattleError, BattleResult};
use crate::progression::RewardCalculator;
use schema::{ElementType, StatKind};

/// Tunables the engine reads while resolving a turn
#[derive(Debug, Clone, PartialEq)]
pub struct BattleRules {
    pub defend_multiplier: f32,
    pub damage_variance: (u32, u32),
    pub exp_per_opponent_level: u32,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

impl From<&GameConfig> for BattleRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            defend_multiplier: config.defend_multiplier,
            damage_variance: config.damage_variance,
            exp_per_opponent_level: config.exp_per_opponent_level,
        }
    }
}

/// Sides that owe an action in the current phase
pub fn sides_to_act(session: &BattleSession) -> Vec<usize> {
    match session.phase {
        BattlePhase::SelectingAction => vec![PLAYER_SIDE, OPPONENT_SIDE],
        BattlePhase::AwaitingReplacement => vec![PLAYER_SIDE],
        _ => Vec::new(),
    }
}

/// Decide actions for every AI-controlled side that still owes one.
/// Queue the results with `session.action_queue` before resolving.
pub fn collect_npc_actions(session: &BattleSession, data: &GameData) -> Vec<(usize, PlayerAction)> {
    let ai_brain = ScoringAI::new();
    sides_to_act(session)
        .into_iter()
        .filter(|side| {
            session.sides[*side].controller == Controller::Ai && session.action_queue[*side].is_none()
        })
        .map(|side| {
            let action = ai_brain.decide_action(side, session, data);
            log::debug!("Chosen action for side {}: {}", side, action);
            (side, action)
        })
        .collect()
}

/// Check an action against the current battle state without touching it
pub fn validate_player_action(
    session: &BattleSession,
    data: &GameData,
    side: usize,
    action: &PlayerAction,
) -> BattleResult<()> {
    if session.is_over() {
        return Err(BattleError::BattleOver);
    }

    let player = &session.sides[side];

    if session.phase == BattlePhase::AwaitingReplacement
        && side == PLAYER_SIDE
        && !matches!(action, PlayerAction::Switch { .. })
    {
        return Err(BattleError::ReplacementRequired(side));
    }

    match action {
        PlayerAction::Attack { ability } => {
            let monster = player
                .active_monster()
                .ok_or(BattleError::NoActiveMonster(side))?;
            if monster.is_fainted() {
                return Err(BattleError::ActorFainted(player.active));
            }
            let ability_data = data
                .ability(ability)
                .map_err(|_| BattleError::UnknownAbility(ability.clone()))?;
            monster.check_ability(ability, ability_data)?;
        }
        PlayerAction::Defend => {
            let monster = player
                .active_monster()
                .ok_or(BattleError::NoActiveMonster(side))?;
            if monster.is_fainted() {
                return Err(BattleError::ActorFainted(player.active));
            }
        }
        PlayerAction::Switch { slot } => match player.roster.get(*slot) {
            Some(target) if !target.is_fainted() && *slot != player.active => {}
            _ => return Err(BattleError::InvalidSwitchTarget(*slot)),
        },
        PlayerAction::Flee => {
            if !session.can_flee() {
                return Err(BattleError::CannotFlee);
            }
        }
    }

    Ok(())
}

/// Every action the side could legally queue right now
pub fn get_valid_actions(session: &BattleSession, data: &GameData, side: usize) -> Vec<PlayerAction> {
    let player = &session.sides[side];
    let mut actions = Vec::new();

    // During a replacement only switches are allowed
    if session.phase == BattlePhase::AwaitingReplacement && side == PLAYER_SIDE {
        return player
            .bench()
            .into_iter()
            .map(|slot| PlayerAction::Switch { slot })
            .collect();
    }

    if let Some(monster) = player.active_monster() {
        if !monster.is_fainted() {
            for ability in monster.get_abilities() {
                let usable = data
                    .ability(ability)
                    .is_ok_and(|ability_data| monster.can_afford(ability_data));
                if usable {
                    actions.push(PlayerAction::Attack {
                        ability: ability.to_string(),
                    });
                }
            }
            actions.push(PlayerAction::Defend);
        }
    }

    for slot in player.bench() {
        actions.push(PlayerAction::Switch { slot });
    }

    if session.can_flee() {
        actions.push(PlayerAction::Flee);
    }

    actions
}

/// Check if battle is ready for turn resolution (every side that owes an action has one queued)
pub fn ready_for_turn_resolution(session: &BattleSession) -> bool {
    let sides = sides_to_act(session);
    !sides.is_empty() && sides.iter().all(|side| session.action_queue[*side].is_some())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActionPriority {
    action_priority: u8, // Flee: 3, Switch: 2, Defend: 1, Attack: 0
    speed: u32,
    side_order: u8, // Player side wins exact ties
}

fn calculate_action_priority(side: usize, action: &PlayerAction, session: &BattleSession) -> ActionPriority {
    let action_priority = match action {
        PlayerAction::Flee => 3,
        PlayerAction::Switch { .. } => 2,
        PlayerAction::Defend => 1,
        PlayerAction::Attack { .. } => 0,
    };
    let speed = session.sides[side]
        .active_monster()
        .map_or(0, |monster| monster.get_stat(StatKind::Speed));
    ActionPriority {
        action_priority,
        speed,
        side_order: if side == PLAYER_SIDE { 1 } else { 0 },
    }
}

/// Sort queued actions: action class first, then the acting monster's speed
/// (descending), then player side before opponent side.
pub fn determine_action_order(
    session: &BattleSession,
    actions: &[(usize, PlayerAction)],
) -> Vec<(usize, PlayerAction)> {
    let mut prioritized: Vec<(usize, PlayerAction, ActionPriority)> = actions
        .iter()
        .map(|(side, action)| (*side, action.clone(), calculate_action_priority(*side, action, session)))
        .collect();

    prioritized.sort_by(|a, b| {
        b.2.action_priority
            .cmp(&a.2.action_priority)
            .then_with(|| b.2.speed.cmp(&a.2.speed))
            .then_with(|| b.2.side_order.cmp(&a.2.side_order))
    });

    prioritized
        .into_iter()
        .map(|(side, action, _)| (side, action))
        .collect()
}

/// Damage dealt by one hit.
///
/// `base_damage` is the attacker's base damage with variance already applied.
/// Element effectiveness scales it, the defender's defense is subtracted and
/// the result never drops below 1. A defending target takes
/// `defend_multiplier` of that, again at least 1.
pub fn calculate_damage(
    base_damage: f32,
    defense: u32,
    effectiveness: f32,
    defending: bool,
    defend_multiplier: f32,
) -> u32 {
    let scaled = base_damage * effectiveness;
    let raw = (scaled - defense as f32).floor().max(1.0) as u32;
    if defending {
        ((raw as f32 * defend_multiplier).floor() as u32).max(1)
    } else {
        raw
    }
}

/// Main entry point for turn resolution.
/// Validates every queued action before mutating anything, executes them in
/// priority order and returns the events of the turn.
pub fn resolve_turn(
    session: &mut BattleSession,
    data: &GameData,
    rules: &BattleRules,
    rng: &mut TurnRng,
) -> BattleResult<EventBus> {
    if session.is_over() {
        return Err(BattleError::BattleOver);
    }

    let mut bus = EventBus::new();

    if session.phase == BattlePhase::AwaitingReplacement {
        resolve_replacement_phase(session, data, &mut bus)?;
        return Ok(bus);
    }

    // 1. Gather and validate
    let mut actions = Vec::with_capacity(2);
    for side in [PLAYER_SIDE, OPPONENT_SIDE] {
        let action = session.action_queue[side]
            .clone()
            .ok_or(BattleError::MissingAction(side))?;
        validate_player_action(session, data, side, &action)?;
        actions.push((side, action));
    }

    // 2. Initialization
    initialize_turn(session, &mut bus);

    // 3. Execute in order until someone flees or a side is wiped out
    for (side, action) in determine_action_order(session, &actions) {
        execute_battle_action(side, &action, session, data, rules, rng, &mut bus)?;
        if session.phase != BattlePhase::ResolvingTurn {
            break;
        }
    }

    // 4. Cleanup & Finalization
    finalize_turn(session, rules, &mut bus);

    Ok(bus)
}

fn resolve_replacement_phase(session: &mut BattleSession, data: &GameData, bus: &mut EventBus) -> BattleResult<()> {
    let action = session.action_queue[PLAYER_SIDE]
        .clone()
        .ok_or(BattleError::MissingAction(PLAYER_SIDE))?;
    validate_player_action(session, data, PLAYER_SIDE, &action)?;

    if let PlayerAction::Switch { slot } = action {
        execute_switch(PLAYER_SIDE, slot, session, bus)?;
    }
    session.action_queue = [None, None];
    session.phase = BattlePhase::SelectingAction;
    Ok(())
}

fn initialize_turn(session: &mut BattleSession, bus: &mut EventBus) {
    session.phase = BattlePhase::ResolvingTurn;
    bus.push(BattleEvent::TurnStarted {
        turn_number: session.turn_number,
    });
    let active = session.sides[PLAYER_SIDE].active;
    session.participation.record(active);
}

fn execute_battle_action(
    side: usize,
    action: &PlayerAction,
    session: &mut BattleSession,
    data: &GameData,
    rules: &BattleRules,
    rng: &mut TurnRng,
    bus: &mut EventBus,
) -> BattleResult<()> {
    // A monster knocked out earlier in the turn does not get to act
    if let Some(monster) = session.sides[side].active_monster() {
        if monster.is_fainted() && !matches!(action, PlayerAction::Switch { .. } | PlayerAction::Flee) {
            bus.push(BattleEvent::ActionSkipped {
                side,
                monster: monster.name.clone(),
            });
            return Ok(());
        }
    }

    match action {
        PlayerAction::Flee => {
            log::info!("Side {} fled the battle", side);
            bus.push(BattleEvent::Fled { side });
            session.phase = BattlePhase::Fled;
            bus.push(BattleEvent::BattleEnded {
                outcome: BattleOutcome::Fled,
            });
        }
        PlayerAction::Switch { slot } => execute_switch(side, *slot, session, bus)?,
        PlayerAction::Defend => {
            let monster = session.sides[side]
                .active_monster_mut()
                .ok_or(BattleError::NoActiveMonster(side))?;
            monster.defending = true;
            bus.push(BattleEvent::Defending {
                side,
                monster: monster.name.clone(),
            });
        }
        PlayerAction::Attack { ability } => execute_attack(side, ability, session, data, rules, rng, bus)?,
    }
    Ok(())
}

fn execute_switch(side: usize, slot: usize, session: &mut BattleSession, bus: &mut EventBus) -> BattleResult<()> {
    let old_monster = session.sides[side]
        .active_monster()
        .map(|monster| monster.name.clone())
        .unwrap_or_default();
    session.sides[side].switch_to(slot)?;
    if side == PLAYER_SIDE {
        session.participation.record(slot);
    }
    let new_monster = session.sides[side]
        .active_monster()
        .map(|monster| monster.name.clone())
        .unwrap_or_default();
    bus.push(BattleEvent::MonsterSwitched {
        side,
        old_monster,
        new_monster,
    });
    Ok(())
}

fn execute_attack(
    side: usize,
    ability_id: &str,
    session: &mut BattleSession,
    data: &GameData,
    rules: &BattleRules,
    rng: &mut TurnRng,
    bus: &mut EventBus,
) -> BattleResult<()> {
    let ability = data
        .ability(ability_id)
        .map_err(|_| BattleError::UnknownAbility(ability_id.to_string()))?;

    let attacker = session.sides[side]
        .active_monster_mut()
        .ok_or(BattleError::NoActiveMonster(side))?;
    attacker.reduce_energy(ability_id, ability)?;
    let base_damage = attacker.get_base_damage(ability);
    bus.push(BattleEvent::AbilityUsed {
        side,
        monster: attacker.name.clone(),
        ability: ability_id.to_string(),
        energy_left: attacker.energy,
    });

    let (low, high) = rules.damage_variance;
    let percent = rng.next_percent("damage variance", low..=high.max(low));
    let rolled = base_damage * percent as f32 / 100.0;

    // Negative multipliers heal the caster's side and ignore defense
    if ability.is_healing() {
        let amount = (-rolled).floor().max(1.0) as u32;
        let target = session.sides[side]
            .active_monster_mut()
            .ok_or(BattleError::NoActiveMonster(side))?;
        let restored = target.restore_health(amount);
        bus.push(BattleEvent::MonsterHealed {
            side,
            target: target.name.clone(),
            amount: restored,
        });
        return Ok(());
    }

    let defender_side = 1 - side;
    let defender = session.sides[defender_side]
        .active_monster_mut()
        .ok_or(BattleError::NoActiveMonster(defender_side))?;
    let effectiveness = ElementType::effectiveness(ability.element, defender.element);
    let damage = calculate_damage(
        rolled,
        defender.get_stat(StatKind::Defense),
        effectiveness,
        defender.defending,
        rules.defend_multiplier,
    );
    let fainted = defender.take_damage(damage);
    bus.push(BattleEvent::DamageDealt {
        side: defender_side,
        target: defender.name.clone(),
        damage,
        remaining_health: defender.health,
        effectiveness,
    });
    if fainted {
        bus.push(BattleEvent::MonsterFainted {
            side: defender_side,
            monster: defender.name.clone(),
        });
        check_win_conditions(session, bus);
    }
    Ok(())
}

fn check_win_conditions(session: &mut BattleSession, bus: &mut EventBus) {
    let outcome = if session.sides[OPPONENT_SIDE].is_defeated() {
        BattleOutcome::Victory
    } else if session.sides[PLAYER_SIDE].is_defeated() {
        BattleOutcome::Defeat
    } else {
        return;
    };

    session.phase = match outcome {
        BattleOutcome::Victory => BattlePhase::Victory,
        BattleOutcome::Defeat => BattlePhase::Defeat,
        BattleOutcome::Fled => BattlePhase::Fled,
    };
    log::info!("Battle ended on turn {}: {}", session.turn_number, outcome);
    bus.push(BattleEvent::BattleEnded { outcome });
}

fn finalize_turn(session: &mut BattleSession, rules: &BattleRules, bus: &mut EventBus) {
    for side in &mut session.sides {
        for (_, monster) in side.roster.iter_mut() {
            monster.defending = false;
        }
    }

    match session.phase {
        BattlePhase::ResolvingTurn => {
            // The opponent sends out its next monster on its own
            let opponent = &mut session.sides[OPPONENT_SIDE];
            if opponent.active_monster().is_some_and(|m| m.is_fainted()) {
                if let Some(next) = opponent.bench().first().copied() {
                    let old_monster = opponent
                        .active_monster()
                        .map(|m| m.name.clone())
                        .unwrap_or_default();
                    opponent.active = next;
                    let new_monster = opponent
                        .active_monster()
                        .map(|m| m.name.clone())
                        .unwrap_or_default();
                    bus.push(BattleEvent::MonsterSwitched {
                        side: OPPONENT_SIDE,
                        old_monster,
                        new_monster,
                    });
                }
            }

            let player_down = session.sides[PLAYER_SIDE]
                .active_monster()
                .map_or(true, |m| m.is_fainted());
            if player_down {
                session.phase = BattlePhase::AwaitingReplacement;
                bus.push(BattleEvent::ReplacementNeeded { side: PLAYER_SIDE });
            } else {
                session.phase = BattlePhase::SelectingAction;
            }
        }
        BattlePhase::Victory => {
            let calculator = RewardCalculator::new(rules.exp_per_opponent_level);
            calculator.award_victory(session, bus);
            calculator.queue_evolutions(session, bus);
        }
        _ => {}
    }

    session.action_queue = [None, None];
    session.turn_number += 1;
    bus.push(BattleEvent::TurnEnded);
}
