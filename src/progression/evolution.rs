//! Post-battle evolutions, presented strictly one at a time.

use crate::data::GameData;
use crate::errors::DataResult;
use crate::monster::Monster;
use crate::roster::Roster;
use crate::timer::Timer;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvolutionEvent {
    Started { slot: usize, from: String, to: String },
    Completed { slot: usize, species: String },
    /// The queue ran dry and control goes back to the overworld
    Drained,
}

/// The evolution currently being presented
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEvolution {
    pub slot: usize,
    pub from: String,
    pub to: String,
    timer: Timer,
}

impl ActiveEvolution {
    pub fn progress(&self) -> f32 {
        self.timer.progress()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionController {
    queue: VecDeque<(usize, Monster)>, // Roster slot + snapshot taken when queued
    active: Option<ActiveEvolution>,
    duration_ms: u32,
}

impl EvolutionController {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            active: None,
            duration_ms,
        }
    }

    /// Queue a roster slot. The monster is snapshotted now; its evolution
    /// target and level decide what it becomes.
    pub fn enqueue(&mut self, slot: usize, snapshot: Monster) {
        if snapshot.evolution.is_none() {
            log::warn!("{} in slot {} has no evolution, not queued", snapshot, slot);
            return;
        }
        log::debug!("Queued evolution of {} in slot {}", snapshot, slot);
        self.queue.push_back((slot, snapshot));
    }

    pub fn enqueue_slots(&mut self, roster: &Roster, slots: &[usize]) {
        for slot in slots {
            if let Some(monster) = roster.get(*slot) {
                self.enqueue(*slot, monster.clone());
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Nothing running and nothing waiting
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn active(&self) -> Option<&ActiveEvolution> {
        self.active.as_ref()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = None;
    }

    /// Pop the head of the queue and swap the evolved monster into its slot.
    /// The new monster is built fresh at the same level: full health and
    /// energy, no carried experience.
    fn start_next(&mut self, data: &GameData, roster: &mut Roster) -> DataResult<Option<EvolutionEvent>> {
        while let Some((slot, snapshot)) = self.queue.pop_front() {
            let Some(evolution) = snapshot.evolution.as_ref() else {
                continue;
            };
            let evolved = Monster::new(data, &evolution.target, snapshot.level)?;
            if roster.replace(slot, evolved).is_none() {
                log::warn!("Slot {} vanished before {} could evolve", slot, snapshot);
                continue;
            }

            log::info!("{} is evolving into {}", snapshot, evolution.target);
            self.active = Some(ActiveEvolution {
                slot,
                from: snapshot.name.clone(),
                to: evolution.target.clone(),
                timer: Timer::started(self.duration_ms),
            });
            return Ok(Some(EvolutionEvent::Started {
                slot,
                from: snapshot.name.clone(),
                to: evolution.target.clone(),
            }));
        }
        Ok(None)
    }

    /// Advance the running presentation by `dt` seconds. When one finishes the
    /// next queued entry starts in the same call.
    pub fn update(&mut self, dt: f32, data: &GameData, roster: &mut Roster) -> DataResult<Vec<EvolutionEvent>> {
        let mut events = Vec::new();

        let finished = match self.active.as_mut() {
            Some(active) => active.timer.update(dt),
            None => {
                if let Some(started) = self.start_next(data, roster)? {
                    events.push(started);
                }
                return Ok(events);
            }
        };

        if finished {
            if let Some(done) = self.active.take() {
                events.push(EvolutionEvent::Completed {
                    slot: done.slot,
                    species: done.to,
                });
            }
            match self.start_next(data, roster)? {
                Some(started) => events.push(started),
                None => events.push(EvolutionEvent::Drained),
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roster(data: &GameData) -> Roster {
        Roster::from_monsters(vec![
            Monster::new(data, "Plumette", 15).unwrap(),
            Monster::new(data, "Sparchu", 16).unwrap(),
            Monster::new(data, "Finsta", 5).unwrap(),
        ])
    }

    #[test]
    fn test_evolution_replaces_slot_at_same_level() {
        let data = GameData::bundled().unwrap();
        let mut roster = roster(&data);
        roster.get_mut(0).unwrap().take_damage(30);
        roster.get_mut(0).unwrap().update_exp(500);

        let mut controller = EvolutionController::new(1000);
        controller.enqueue_slots(&roster, &[0]);
        let events = controller.update(0.0, &data, &mut roster).unwrap();

        assert_eq!(
            events,
            vec![EvolutionEvent::Started {
                slot: 0,
                from: "Plumette".to_string(),
                to: "Ivieron".to_string(),
            }]
        );
        let evolved = roster.get(0).unwrap();
        assert_eq!(evolved.name, "Ivieron");
        assert_eq!(evolved.level, 15);
        assert_eq!(evolved, &Monster::new(&data, "Ivieron", 15).unwrap());
    }

    #[test]
    fn test_two_evolutions_run_strictly_in_sequence() {
        let data = GameData::bundled().unwrap();
        let mut roster = roster(&data);
        let mut controller = EvolutionController::new(1000);
        controller.enqueue_slots(&roster, &[0, 1]);

        // First starts, second waits
        let events = controller.update(0.0, &data, &mut roster).unwrap();
        assert!(matches!(events.as_slice(), [EvolutionEvent::Started { slot: 0, .. }]));
        assert_eq!(controller.queued(), 1);
        assert_eq!(roster.get(1).unwrap().name, "Sparchu");

        // Halfway through: nothing new happens
        assert!(controller.update(0.5, &data, &mut roster).unwrap().is_empty());
        assert_eq!(controller.active().map(|a| a.slot), Some(0));
        assert_eq!(roster.get(1).unwrap().name, "Sparchu");

        // First completes, and only then does the second start
        let events = controller.update(0.6, &data, &mut roster).unwrap();
        assert_eq!(
            events,
            vec![
                EvolutionEvent::Completed {
                    slot: 0,
                    species: "Ivieron".to_string(),
                },
                EvolutionEvent::Started {
                    slot: 1,
                    from: "Sparchu".to_string(),
                    to: "Cindrill".to_string(),
                },
            ]
        );
        assert_eq!(roster.get(1).unwrap().name, "Cindrill");

        let events = controller.update(1.1, &data, &mut roster).unwrap();
        assert_eq!(
            events,
            vec![
                EvolutionEvent::Completed {
                    slot: 1,
                    species: "Cindrill".to_string(),
                },
                EvolutionEvent::Drained,
            ]
        );
        assert!(controller.is_idle());
    }

    #[test]
    fn test_monsters_without_evolution_are_not_queued() {
        let data = GameData::bundled().unwrap();
        let roster = roster(&data);
        let mut controller = EvolutionController::new(1000);
        controller.enqueue(0, Monster::new(&data, "Pluma", 40).unwrap());
        assert!(controller.is_idle());
        controller.enqueue_slots(&roster, &[9]);
        assert!(controller.is_idle());
    }
}
