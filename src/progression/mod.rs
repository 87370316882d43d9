pub mod evolution;
pub mod participation;
pub mod rewards;

pub use evolution::{ActiveEvolution, EvolutionController};
pub use participation::ParticipationTracker;
pub use rewards::RewardCalculator;
