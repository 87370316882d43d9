use crate::world::map::{Direction, Rect, WorldMap};
use serde::{Deserialize, Serialize};

pub const PLAYER_HITBOX: (f32, f32) = (48.0, 32.0);

/// Persisted player entity state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub pos: [f32; 2],
    pub facing: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub pos: (f32, f32), // Hitbox center
    pub facing: Direction,
    /// Normalized movement intent for this tick. Zero while standing still or blocked.
    pub direction: (f32, f32),
    pub speed: f32,
    pub blocked: bool,
}

impl Player {
    pub fn new(pos: (f32, f32), facing: Direction, speed: f32) -> Self {
        Self {
            pos,
            facing,
            direction: (0.0, 0.0),
            speed,
            blocked: false,
        }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::from_center(self.pos, PLAYER_HITBOX.0, PLAYER_HITBOX.1)
    }

    pub fn is_moving(&self) -> bool {
        self.direction != (0.0, 0.0)
    }

    pub fn block(&mut self) {
        self.blocked = true;
        self.direction = (0.0, 0.0);
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    /// Record this tick's movement intent. Ignored while blocked.
    pub fn set_direction(&mut self, input: (f32, f32)) {
        if self.blocked {
            self.direction = (0.0, 0.0);
            return;
        }
        let length = (input.0 * input.0 + input.1 * input.1).sqrt();
        self.direction = if length > 0.0 {
            (input.0 / length, input.1 / length)
        } else {
            (0.0, 0.0)
        };
        if let Some(facing) = Direction::from_vector(self.direction) {
            self.facing = facing;
        }
    }

    /// Move along each axis separately so the player slides along walls.
    /// `blockers` are extra solid rects on top of the map, such as characters.
    pub fn step(&mut self, dt: f32, map: &WorldMap, blockers: &[Rect]) {
        if !self.is_moving() {
            return;
        }
        let dx = self.direction.0 * self.speed * dt;
        let dy = self.direction.1 * self.speed * dt;

        self.pos.0 += dx;
        if let Some(wall) = Self::first_hit(map, blockers, &self.hitbox()) {
            self.pos.0 = if dx > 0.0 {
                wall.left() - PLAYER_HITBOX.0 / 2.0
            } else {
                wall.right() + PLAYER_HITBOX.0 / 2.0
            };
        }

        self.pos.1 += dy;
        if let Some(wall) = Self::first_hit(map, blockers, &self.hitbox()) {
            self.pos.1 = if dy > 0.0 {
                wall.top() - PLAYER_HITBOX.1 / 2.0
            } else {
                wall.bottom() + PLAYER_HITBOX.1 / 2.0
            };
        }
    }

    fn first_hit(map: &WorldMap, blockers: &[Rect], hitbox: &Rect) -> Option<Rect> {
        map.collisions().chain(blockers.iter()).find(|wall| wall.intersects(hitbox)).copied()
    }

    pub fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            pos: [self.pos.0, self.pos.1],
            facing: self.facing,
        }
    }

    pub fn apply_record(&mut self, record: &PlayerRecord) {
        self.pos = (record.pos[0], record.pos[1]);
        self.facing = record.facing;
        self.direction = (0.0, 0.0);
    }
}
