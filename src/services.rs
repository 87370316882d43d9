//! Narrow interfaces to the host: audio, drawing and input.
//!
//! The core never waits on any of these. Audio cues are fire-and-forget and
//! the renderer receives a read-only snapshot of the tick.

use crate::battle::state::BattlePhase;
use crate::world::map::Direction;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    OverworldMusic,
    BattleMusic,
    /// A trainer spotted the player
    Notice,
    Evolution,
}

pub trait AudioPlayer {
    fn play(&mut self, cue: AudioCue);
}

/// Keys the core reacts to, already mapped from whatever the host polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Confirm,
    /// Tab or I: toggle the monster index
    MonsterIndex,
    Escape,
    QuickSave,
    QuickLoad,
    Close,
}

pub trait InputState {
    /// Whether `key` went down this tick
    fn just_pressed(&self, key: Key) -> bool;
    /// Raw movement intent, each axis in [-1, 1]
    fn movement(&self) -> (f32, f32);
}

/// Input for one tick, built by the host or by tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    pressed: BTreeSet<Key>,
    movement: (f32, f32),
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, key: Key) -> Self {
        self.pressed.insert(key);
        self
    }

    pub fn moving(mut self, direction: Direction) -> Self {
        self.movement = direction.vector();
        self
    }
}

impl InputState for InputFrame {
    fn just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn movement(&self) -> (f32, f32) {
        self.movement
    }
}

/// What is on screen during a battle
#[derive(Debug, Clone, PartialEq)]
pub struct BattleView {
    pub turn_number: u32,
    pub phase: BattlePhase,
    pub player_monster: Option<String>,
    pub opponent_monster: Option<String>,
}

/// Snapshot of one tick handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub world: String,
    pub player_pos: (f32, f32),
    pub player_facing: Direction,
    pub tint_alpha: u8,
    pub dialogue_line: Option<String>,
    pub monster_index_open: bool,
    pub battle: Option<BattleView>,
    /// From species, to species and presentation progress in [0, 1]
    pub evolution: Option<(String, String, f32)>,
}

pub trait Renderer {
    fn draw(&mut self, frame: &Frame);
}

/// Discards every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioPlayer for NullAudio {
    fn play(&mut self, cue: AudioCue) {
        log::trace!("Audio cue {:?}", cue);
    }
}

/// Draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &Frame) {}
}
