use crate::battle::engine::{
    collect_npc_actions, ready_for_turn_resolution, resolve_turn, sides_to_act, validate_player_action, BattleRules,
};
use crate::battle::state::{BattleOutcome, BattlePhase, BattleSession, EventBus, PlayerAction, TurnRng};
use crate::data::GameData;
use crate::errors::{BattleError, BattleResult};
use crate::roster::Roster;
use std::sync::Arc;

/// Upper bound for `run_to_completion` so a stalemate cannot spin forever
pub const MAX_AUTO_TURNS: u32 = 500;

/// Result of executing a battle turn or replacement
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub events: EventBus,
    pub phase: BattlePhase,
    pub outcome: Option<BattleOutcome>,
}

/// High-level battle driver: validates submissions, fills in AI actions and
/// resolves turns as soon as every side that owes an action has one.
#[derive(Debug, Clone)]
pub struct BattleRunner {
    session: BattleSession,
    data: Arc<GameData>,
    rules: BattleRules,
    rng: TurnRng,
}

impl BattleRunner {
    pub fn new(session: BattleSession, data: Arc<GameData>, rules: BattleRules, rng: TurnRng) -> Self {
        Self {
            session,
            data,
            rules,
            rng,
        }
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn is_battle_ended(&self) -> bool {
        self.session.is_over()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.session.outcome()
    }

    /// Whether `side` must submit an action before the next resolution
    pub fn awaiting(&self, side: usize) -> bool {
        sides_to_act(&self.session).contains(&side) && self.session.action_queue[side].is_none()
    }

    /// Submit an action for a side. Invalid actions are rejected before
    /// anything changes, so the caller can simply prompt again.
    /// Executes the turn once every required action is available.
    pub fn submit_action(&mut self, side: usize, action: PlayerAction) -> BattleResult<Option<ExecutionResult>> {
        if self.session.is_over() {
            return Err(BattleError::BattleOver);
        }
        if !sides_to_act(&self.session).contains(&side) {
            return Err(BattleError::ReplacementRequired(1 - side));
        }
        validate_player_action(&self.session, &self.data, side, &action)?;
        self.session.action_queue[side] = Some(action);
        self.auto_execute_if_ready()
    }

    /// Let the AI fill any missing AI-side actions, then resolve if ready
    pub fn auto_execute_if_ready(&mut self) -> BattleResult<Option<ExecutionResult>> {
        for (side, action) in collect_npc_actions(&self.session, &self.data) {
            self.session.action_queue[side] = Some(action);
        }
        if !ready_for_turn_resolution(&self.session) {
            return Ok(None);
        }
        self.execute_internal().map(Some)
    }

    fn execute_internal(&mut self) -> BattleResult<ExecutionResult> {
        let events = resolve_turn(&mut self.session, &self.data, &self.rules, &mut self.rng)?;
        events.log_formatted(&self.session);
        Ok(ExecutionResult {
            events,
            phase: self.session.phase,
            outcome: self.session.outcome(),
        })
    }

    /// Drive an AI-versus-AI battle until it ends. Returns every turn's events.
    pub fn run_to_completion(&mut self) -> BattleResult<Vec<EventBus>> {
        let mut turns = Vec::new();
        for _ in 0..MAX_AUTO_TURNS {
            if self.session.is_over() {
                break;
            }
            match self.auto_execute_if_ready()? {
                Some(result) => turns.push(result.events),
                None => return Err(BattleError::MissingAction(self.first_waiting_side())),
            }
        }
        Ok(turns)
    }

    fn first_waiting_side(&self) -> usize {
        sides_to_act(&self.session)
            .into_iter()
            .find(|side| self.session.action_queue[*side].is_none())
            .unwrap_or_default()
    }

    /// End the battle and hand the session back (player roster included)
    pub fn finish(self) -> BattleSession {
        self.session
    }

    pub fn into_player_roster(self) -> Roster {
        self.session.into_player_roster()
    }
}
