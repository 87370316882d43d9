use std::collections::BTreeSet;

/// Tracks which of the player's roster slots took the field during a battle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipationTracker {
    participants: BTreeSet<usize>,
}

impl ParticipationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the monster in `slot` was active for a turn
    pub fn record(&mut self, slot: usize) {
        self.participants.insert(slot);
    }

    pub fn has_participated(&self, slot: usize) -> bool {
        self.participants.contains(&slot)
    }

    /// Participating slots, in slot order, that pass the filter
    pub fn participants_where(&self, mut keep: impl FnMut(usize) -> bool) -> Vec<usize> {
        self.participants.iter().copied().filter(|slot| keep(*slot)).collect()
    }
}
