use crate::data::GameData;
use crate::errors::DataResult;
use crate::monster::{Monster, MonsterRecord};
use schema::MonsterTemplate;
use std::collections::BTreeMap;

/// A combatant's monsters keyed by stable slot index. Iteration follows slot
/// order, which is the party order. Replacing a monster never moves its slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    slots: BTreeMap<usize, Monster>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots are assigned 0, 1, 2, ... in the given order
    pub fn from_monsters(monsters: impl IntoIterator<Item = Monster>) -> Self {
        Self {
            slots: monsters.into_iter().enumerate().collect(),
        }
    }

    pub fn from_templates(data: &GameData, templates: &[MonsterTemplate]) -> DataResult<Self> {
        let monsters = templates
            .iter()
            .map(|template| Monster::new(data, &template.name, template.level))
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self::from_monsters(monsters))
    }

    pub fn from_records(data: &GameData, records: &[MonsterRecord]) -> DataResult<Self> {
        let monsters = records
            .iter()
            .map(|record| Monster::from_record(data, record))
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self::from_monsters(monsters))
    }

    pub fn to_records(&self) -> Vec<MonsterRecord> {
        self.slots.values().map(Monster::to_record).collect()
    }

    /// Append at the next free slot and return it
    pub fn push(&mut self, monster: Monster) -> usize {
        let slot = self.slots.keys().next_back().map_or(0, |last| last + 1);
        self.slots.insert(slot, monster);
        slot
    }

    /// Swap in a new monster at an existing slot, returning the old one
    pub fn replace(&mut self, slot: usize, monster: Monster) -> Option<Monster> {
        match self.slots.get_mut(&slot) {
            Some(existing) => Some(std::mem::replace(existing, monster)),
            None => None,
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Monster> {
        self.slots.get(&slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Monster> {
        self.slots.get_mut(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Monster)> {
        self.slots.iter().map(|(slot, monster)| (*slot, monster))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Monster)> {
        self.slots.iter_mut().map(|(slot, monster)| (*slot, monster))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots of monsters that can still fight, in party order
    pub fn healthy_slots(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, monster)| !monster.is_fainted())
            .map(|(slot, _)| slot)
            .collect()
    }

    pub fn first_healthy(&self) -> Option<usize> {
        self.iter()
            .find(|(_, monster)| !monster.is_fainted())
            .map(|(slot, _)| slot)
    }

    pub fn all_fainted(&self) -> bool {
        self.slots.values().all(Monster::is_fainted)
    }

    /// Restore every monster to full health and energy
    pub fn heal_all(&mut self) {
        for monster in self.slots.values_mut() {
            monster.heal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn starter_roster(data: &GameData) -> Roster {
        Roster::from_templates(
            data,
            &[
                MonsterTemplate::new("Plumette", 5),
                MonsterTemplate::new("Sparchu", 5),
                MonsterTemplate::new("Finsta", 5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_slots_follow_insertion_order() {
        let data = GameData::bundled().unwrap();
        let roster = starter_roster(&data);
        let names: Vec<(usize, &str)> = roster.iter().map(|(slot, m)| (slot, m.name.as_str())).collect();
        assert_eq!(names, vec![(0, "Plumette"), (1, "Sparchu"), (2, "Finsta")]);
    }

    #[test]
    fn test_replace_keeps_slot() {
        let data = GameData::bundled().unwrap();
        let mut roster = starter_roster(&data);
        let evolved = Monster::new(&data, "Ivieron", 5).unwrap();

        let old = roster.replace(0, evolved).unwrap();
        assert_eq!(old.name, "Plumette");
        assert_eq!(roster.get(0).unwrap().name, "Ivieron");
        assert_eq!(roster.iter().map(|(slot, _)| slot).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(roster.replace(7, old).is_none());
    }

    #[test]
    fn test_healthy_tracking() {
        let data = GameData::bundled().unwrap();
        let mut roster = starter_roster(&data);
        roster.get_mut(0).unwrap().take_damage(10_000);

        assert_eq!(roster.healthy_slots(), vec![1, 2]);
        assert_eq!(roster.first_healthy(), Some(1));

        roster.get_mut(1).unwrap().take_damage(10_000);
        roster.get_mut(2).unwrap().take_damage(10_000);
        assert!(roster.all_fainted());

        roster.heal_all();
        assert_eq!(roster.healthy_slots(), vec![0, 1, 2]);
    }

    #[test]
    fn test_records_roundtrip() {
        let data = GameData::bundled().unwrap();
        let mut roster = starter_roster(&data);
        roster.get_mut(1).unwrap().take_damage(12);
        roster.get_mut(2).unwrap().update_exp(40);

        let records = roster.to_records();
        let restored = Roster::from_records(&data, &records).unwrap();
        assert_eq!(restored.to_records(), records);
    }

    #[test]
    fn test_push_uses_next_slot() {
        let data = GameData::bundled().unwrap();
        let mut roster = Roster::new();
        assert!(roster.is_empty());
        assert_eq!(roster.push(Monster::new(&data, "Atrox", 3).unwrap()), 0);
        assert_eq!(roster.push(Monster::new(&data, "Pouch", 3).unwrap()), 1);
        assert_eq!(roster.len(), 2);
    }
}
