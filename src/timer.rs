/// Cooperative countdown advanced by the tick's delta time.
/// A timer runs once and deactivates itself when the duration elapses.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    duration_ms: f32,
    elapsed_ms: f32,
    active: bool,
}

impl Timer {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms: duration_ms as f32,
            elapsed_ms: 0.0,
            active: false,
        }
    }

    /// A timer that is already running
    pub fn started(duration_ms: u32) -> Self {
        let mut timer = Self::new(duration_ms);
        timer.activate();
        timer
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.elapsed_ms = 0.0;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.elapsed_ms = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance by `dt` seconds. Returns true on the tick the timer finishes.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed_ms += dt * 1000.0;
        if self.elapsed_ms >= self.duration_ms {
            self.deactivate();
            return true;
        }
        false
    }

    /// Completed fraction in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_runs_once() {
        let mut timer = Timer::started(250);
        assert!(!timer.update(0.1));
        assert!(timer.is_active());
        assert!(timer.update(0.2));
        assert!(!timer.is_active());
        assert!(!timer.update(1.0), "an inactive timer never fires");
    }

    #[test]
    fn test_deactivate_resets_progress() {
        let mut timer = Timer::started(100);
        timer.update(0.05);
        assert!(timer.progress() > 0.4);
        timer.deactivate();
        assert_eq!(timer.progress(), 0.0);
        assert!(!timer.is_active());
    }
}
