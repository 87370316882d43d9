use crate::battle::state::BattleSession;

pub const FULL_TINT: f32 = 255.0;

/// What the orchestrator swaps in once the screen is fully tinted
#[derive(Debug, Clone, Default)]
pub enum TransitionTarget {
    #[default]
    NoTransition,
    /// Load a map and place the player at a named spawn
    Map { target: String, spawn: String },
    /// Enter a prepared battle
    Battle(Box<BattleSession>),
    /// Leave the current battle. `respawn` is set after a defeat.
    EndBattle { respawn: Option<(String, String)> },
}

impl TransitionTarget {
    pub fn is_pending(&self) -> bool {
        !matches!(self, TransitionTarget::NoTransition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TintMode {
    #[default]
    Untinting,
    Idle,
    Tinting,
}

/// Screen crossfade. The world-state swap happens exactly once, at full opacity.
#[derive(Debug, Clone)]
pub struct Transition {
    pub mode: TintMode,
    progress: f32,
    speed: f32,
    target: TransitionTarget,
}

impl Transition {
    pub fn new(speed: f32) -> Self {
        Self {
            mode: TintMode::Untinting,
            progress: 0.0,
            speed,
            target: TransitionTarget::NoTransition,
        }
    }

    /// Begin fading out towards a new target. A request made while another
    /// transition is in flight is dropped and returns false.
    pub fn request(&mut self, target: TransitionTarget) -> bool {
        if self.target.is_pending() || self.mode == TintMode::Tinting {
            log::debug!("Transition already in progress, ignoring {}", target_name(&target));
            return false;
        }
        self.target = target;
        self.mode = TintMode::Tinting;
        true
    }

    pub fn is_busy(&self) -> bool {
        self.mode == TintMode::Tinting || self.target.is_pending()
    }

    pub fn pending(&self) -> &TransitionTarget {
        &self.target
    }

    pub fn alpha(&self) -> u8 {
        self.progress.clamp(0.0, FULL_TINT) as u8
    }

    /// Advance the fade by `dt` seconds. Returns the target to swap in on the
    /// tick the screen reaches full opacity.
    pub fn update(&mut self, dt: f32) -> Option<TransitionTarget> {
        let mut swapped = None;
        match self.mode {
            TintMode::Untinting => {
                self.progress -= self.speed * dt;
                if self.progress <= 0.0 {
                    self.mode = TintMode::Idle;
                }
            }
            TintMode::Tinting => {
                self.progress += self.speed * dt;
                if self.progress >= FULL_TINT {
                    swapped = Some(std::mem::take(&mut self.target));
                    self.mode = TintMode::Untinting;
                }
            }
            TintMode::Idle => {}
        }
        self.progress = self.progress.clamp(0.0, FULL_TINT);
        swapped
    }
}

fn target_name(target: &TransitionTarget) -> &'static str {
    match target {
        TransitionTarget::NoTransition => "none",
        TransitionTarget::Map { .. } => "map",
        TransitionTarget::Battle(_) => "battle",
        TransitionTarget::EndBattle { .. } => "end battle",
    }
}
