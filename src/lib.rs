// In: src/lib.rs

//! Monster Adventure Core
//!
//! Battle, progression and overworld orchestration for a tile-based
//! monster-collecting RPG. Rendering, audio and input stay with the host and
//! are reached through the narrow traits in `services`.

// --- MODULE DECLARATIONS ---
// This declares the module hierarchy for the crate.
pub mod battle;
pub mod config;
pub mod data;
pub mod encounter;
pub mod errors;
pub mod monster;
pub mod persistence;
pub mod progression;
pub mod roster;
pub mod services;
pub mod timer;
pub mod world;

// --- PUBLIC API RE-EXPORTS ---
// This section defines the public-facing API of the `monster-adventure` crate,
// making it easy for users to import the most important types directly.

// --- From the `schema` crate ---
// Re-export the static table records and enums.
pub use schema::{
    // Static records
    AbilityData,
    AbilitySchedule,
    BaseStats,
    // Core Enums
    ElementType,
    EvolutionData,
    MonsterTemplate,
    SpeciesData,
    StatKind,
    TargetKind,
};

// --- From this crate's modules (`src/`) ---

// Core battle engine functions and state.
pub use battle::engine::{collect_npc_actions, ready_for_turn_resolution, resolve_turn, BattleRules};
pub use battle::runner::{BattleRunner, ExecutionResult};
pub use battle::state::{
    BattleEvent, BattleKind, BattleOutcome, BattlePhase, BattleSession, Controller, EventBus, PlayerAction, TurnRng,
};

// Core runtime types.
pub use monster::{Monster, MonsterRecord};
pub use roster::Roster;
pub use world::Game;

// Static tables and tunables.
pub use config::GameConfig;
pub use data::GameData;

// Crate-specific error and result types.
pub use errors::{
    BattleError, BattleResult, DataError, DataResult, GameError, GameResult, MonsterError, SaveError, SaveResult,
};
