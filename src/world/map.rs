use crate::errors::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Axis-aligned rectangle in world pixels. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_center(center: (f32, f32), width: f32, height: f32) -> Self {
        Self::new(center.0 - width / 2.0, center.1 - height / 2.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap: rectangles that only share an edge do not collide.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in screen coordinates (y grows downwards)
    pub fn vector(&self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    /// The facing that best describes a movement or look vector.
    /// Horizontal wins on an exact diagonal. Returns `None` for a zero vector.
    pub fn from_vector(vector: (f32, f32)) -> Option<Self> {
        let (dx, dy) = vector;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0.0 { Direction::Right } else { Direction::Left })
        } else {
            Some(if dy > 0.0 { Direction::Down } else { Direction::Up })
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
}

impl SpawnPoint {
    pub fn pos(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// A patch of tall grass (or sand, or water) where wild monsters live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterZone {
    pub area: Rect,
    pub biome: String,
    pub min_level: u32,
    pub max_level: u32,
    pub monsters: Vec<String>, // Species names, drawn uniformly
}

/// Walking into `area` moves the player to `spawn` on map `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionZone {
    pub area: Rect,
    pub target: String,
    pub spawn: String,
}

/// Where an NPC stands on a map. The NPC's roster and dialogue live in the
/// character table under `character_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterPlacement {
    pub character_id: String,
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    /// Line-of-sight distance at which a trainer notices the player. 0 disables it.
    #[serde(default)]
    pub radius: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    pub spawns: BTreeMap<String, SpawnPoint>,
    #[serde(default)]
    pub collisions: Vec<Rect>,
    #[serde(default)]
    pub encounter_zones: Vec<EncounterZone>,
    #[serde(default)]
    pub transitions: Vec<TransitionZone>,
    #[serde(default)]
    pub characters: Vec<CharacterPlacement>,
}

impl WorldMap {
    /// Look up a named spawn point. `map_name` is only used for the error.
    pub fn spawn(&self, map_name: &str, spawn: &str) -> DataResult<&SpawnPoint> {
        self.spawns.get(spawn).ok_or_else(|| DataError::UnknownSpawn {
            map: map_name.to_string(),
            spawn: spawn.to_string(),
        })
    }

    /// First encounter zone overlapping the hitbox, in map order
    pub fn encounter_zone_at(&self, hitbox: &Rect) -> Option<&EncounterZone> {
        self.encounter_zones.iter().find(|zone| zone.area.intersects(hitbox))
    }

    pub fn transition_at(&self, hitbox: &Rect) -> Option<&TransitionZone> {
        self.transitions.iter().find(|zone| zone.area.intersects(hitbox))
    }

    pub fn collisions(&self) -> impl Iterator<Item = &Rect> {
        self.collisions.iter()
    }
}
