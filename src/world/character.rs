use crate::data::GameData;
use crate::errors::DataResult;
use crate::roster::Roster;
use crate::world::map::{CharacterPlacement, Direction, Rect};
use schema::MonsterTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How far in front of the player an NPC can be talked to
pub const TALK_REACH: f32 = 128.0;
/// Sideways slack allowed for both talking and line-of-sight checks
pub const SIGHT_TOLERANCE: f32 = 30.0;
pub const CHARACTER_SIZE: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterRole {
    #[default]
    Trainer,
    /// Heals the roster when the conversation ends
    Nurse,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DialogueLines {
    pub default: Vec<String>,
    pub defeated: Vec<String>,
}

/// Static description of an NPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterData {
    pub monsters: Vec<MonsterTemplate>,
    pub dialogue: DialogueLines,
    pub biome: String,
    #[serde(default)]
    pub role: CharacterRole,
    /// Spawn name recorded as the defeat-recovery point after talking
    #[serde(default)]
    pub checkpoint: Option<String>,
    /// Initial defeated flag for a new game
    #[serde(default)]
    pub defeated: bool,
}

impl CharacterData {
    pub fn lines(&self, defeated: bool) -> &[String] {
        if defeated {
            &self.dialogue.defeated
        } else {
            &self.dialogue.default
        }
    }

    /// A fresh copy of this NPC's battle roster
    pub fn build_roster(&self, data: &GameData) -> DataResult<Roster> {
        Roster::from_templates(data, &self.monsters)
    }

    pub fn is_trainer(&self) -> bool {
        self.role == CharacterRole::Trainer && !self.monsters.is_empty()
    }
}

/// Per-NPC progress that outlives map changes and is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterFlags {
    pub defeated: bool,
}

pub type CharacterBook = BTreeMap<String, CharacterFlags>;

/// Initial progress for every NPC in the registry
pub fn initial_book(data: &GameData) -> CharacterBook {
    data.characters()
        .iter()
        .map(|(id, character)| {
            (
                id.clone(),
                CharacterFlags {
                    defeated: character.defeated,
                },
            )
        })
        .collect()
}

/// Runtime NPC standing on the current map
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: String,
    pub pos: (f32, f32),
    pub facing: Direction,
    pub radius: f32,
    /// Set once the NPC has spotted the player, so it does not re-trigger
    pub noticed: bool,
}

impl Character {
    pub fn from_placement(placement: &CharacterPlacement) -> Self {
        Self {
            id: placement.character_id.clone(),
            pos: (placement.x, placement.y),
            facing: placement.facing,
            radius: placement.radius,
            noticed: false,
        }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::from_center(self.pos, CHARACTER_SIZE, CHARACTER_SIZE)
    }

    /// Turn towards a point
    pub fn face(&mut self, target: (f32, f32)) {
        let look = (target.0 - self.pos.0, target.1 - self.pos.1);
        if let Some(direction) = Direction::from_vector(look) {
            self.facing = direction;
        }
    }

    /// Whether `target` lies along this NPC's facing within `radius`
    pub fn sees(&self, target: (f32, f32)) -> bool {
        if self.radius <= 0.0 || self.noticed {
            return false;
        }
        in_line_of_sight(self.pos, self.facing, target, self.radius)
    }
}

/// True when `target` is ahead of `origin` along `facing`, no further than
/// `reach`, and within `SIGHT_TOLERANCE` of the facing axis.
pub fn in_line_of_sight(origin: (f32, f32), facing: Direction, target: (f32, f32), reach: f32) -> bool {
    let (dx, dy) = (target.0 - origin.0, target.1 - origin.1);
    let (ahead, sideways) = match facing {
        Direction::Up => (-dy, dx),
        Direction::Down => (dy, dx),
        Direction::Left => (-dx, dy),
        Direction::Right => (dx, dy),
    };
    ahead > 0.0 && ahead <= reach && sideways.abs() <= SIGHT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn trainer_facing(facing: Direction) -> Character {
        Character {
            id: "o1".to_string(),
            pos: (100.0, 100.0),
            facing,
            radius: 300.0,
            noticed: false,
        }
    }

    #[rstest]
    #[case(Direction::Right, (300.0, 110.0), true)]
    #[case(Direction::Right, (500.0, 100.0), false)]
    #[case(Direction::Right, (50.0, 100.0), false)]
    #[case(Direction::Up, (100.0, 0.0), true)]
    #[case(Direction::Up, (180.0, 0.0), false)]
    fn test_line_of_sight(#[case] facing: Direction, #[case] target: (f32, f32), #[case] expected: bool) {
        assert_eq!(trainer_facing(facing).sees(target), expected);
    }

    #[test]
    fn test_noticed_trainer_does_not_retrigger() {
        let mut trainer = trainer_facing(Direction::Right);
        trainer.noticed = true;
        assert!(!trainer.sees((200.0, 100.0)));
    }

    #[test]
    fn test_face_turns_towards_target() {
        let mut trainer = trainer_facing(Direction::Down);
        trainer.face((100.0, 20.0));
        assert_eq!(trainer.facing, Direction::Up);
        trainer.face((20.0, 100.0));
        assert_eq!(trainer.facing, Direction::Left);
    }

    #[test]
    fn test_registry_characters() {
        let data = GameData::bundled().unwrap();
        let nurse = data.character("Nurse").unwrap();
        assert_eq!(nurse.role, CharacterRole::Nurse);
        assert!(!nurse.is_trainer());
        assert_eq!(nurse.checkpoint.as_deref(), Some("nurse"));

        let trainer = data.character("o1").unwrap();
        assert!(trainer.is_trainer());
        assert_eq!(trainer.lines(false).len(), 3);
        assert_eq!(trainer.build_roster(&data).unwrap().len(), 2);

        let book = initial_book(&data);
        assert_eq!(book.get("o1"), Some(&CharacterFlags { defeated: false }));
    }
}
