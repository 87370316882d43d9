use crate::battle::state::{BattleEvent, BattleSession, EventBus, OPPONENT_SIDE, PLAYER_SIDE};

/// Calculator for the experience handed out after a won battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardCalculator {
    exp_per_opponent_level: u32,
}

impl RewardCalculator {
    pub fn new(exp_per_opponent_level: u32) -> Self {
        Self {
            exp_per_opponent_level,
        }
    }

    /// Experience each participant receives for one defeated opponent.
    /// Formula: opponent_level × exp_per_opponent_level / participants (integer division)
    pub fn share_for(&self, opponent_level: u32, participants: usize) -> u32 {
        if participants == 0 {
            return 0;
        }
        opponent_level * self.exp_per_opponent_level / participants as u32
    }

    /// Award experience for every defeated opponent, in opponent slot order.
    ///
    /// Participants are the player's monsters that took the field at some point
    /// and are still standing. Each defeated opponent is a separate award, so a
    /// monster can gain one level per opponent.
    pub fn award_victory(&self, session: &mut BattleSession, bus: &mut EventBus) {
        let opponent_levels: Vec<u32> = session.sides[OPPONENT_SIDE]
            .roster
            .iter()
            .filter(|(_, monster)| monster.is_fainted())
            .map(|(_, monster)| monster.level)
            .collect();

        let player_roster = &session.sides[PLAYER_SIDE].roster;
        let participants = session.participation.participants_where(|slot| {
            player_roster
                .get(slot)
                .is_some_and(|monster| !monster.is_fainted())
        });

        for opponent_level in opponent_levels {
            let share = self.share_for(opponent_level, participants.len());
            for slot in &participants {
                let Some(monster) = session.sides[PLAYER_SIDE].roster.get_mut(*slot) else {
                    continue;
                };
                let leveled = monster.update_exp(share);
                bus.push(BattleEvent::ExperienceGained {
                    slot: *slot,
                    monster: monster.name.clone(),
                    amount: share,
                });
                if leveled {
                    bus.push(BattleEvent::LevelUp {
                        slot: *slot,
                        monster: monster.name.clone(),
                        new_level: monster.level,
                    });
                }
            }
        }
    }

    /// Roster slots whose monster has reached its evolution level.
    /// Every monster is checked, not just the ones that fought.
    pub fn evolution_candidates(&self, session: &BattleSession) -> Vec<(usize, String)> {
        session.sides[PLAYER_SIDE]
            .roster
            .iter()
            .filter_map(|(slot, monster)| {
                monster
                    .evolution_due()
                    .map(|evolution| (slot, evolution.target.clone()))
            })
            .collect()
    }

    /// Record the evolution candidates on the session and announce them
    pub fn queue_evolutions(&self, session: &mut BattleSession, bus: &mut EventBus) {
        for (slot, target) in self.evolution_candidates(session) {
            if session.pending_evolutions.contains(&slot) {
                continue;
            }
            if let Some(monster) = session.sides[PLAYER_SIDE].roster.get(slot) {
                bus.push(BattleEvent::EvolutionReady {
                    slot,
                    monster: monster.name.clone(),
                    target,
                });
            }
            session.pending_evolutions.push(slot);
        }
    }
}
