use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the monster adventure core
#[derive(Debug, Error)]
pub enum GameError {
    /// Error related to static table lookup or loading
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Error related to a single monster's resources
    #[error("Monster error: {0}")]
    Monster(#[from] MonsterError),
    /// Error related to an invalid battle action or battle state
    #[error("Battle error: {0}")]
    Battle(#[from] BattleError),
    /// Error related to reading or writing save files
    #[error("Save error: {0}")]
    Save(#[from] SaveError),
}

/// Errors raised while loading or querying the static tables.
/// These are fatal during world setup.
#[derive(Debug, Error)]
pub enum DataError {
    /// The species key is not in the species table
    #[error("Invalid species: {0}")]
    InvalidSpecies(String),
    /// The ability id is not in the ability table
    #[error("Unknown ability: {0}")]
    UnknownAbility(String),
    /// The map name is not in the world table
    #[error("Unknown map: {0}")]
    UnknownMap(String),
    /// The spawn point does not exist on the map
    #[error("Unknown spawn '{spawn}' on map '{map}'")]
    UnknownSpawn { map: String, spawn: String },
    /// The character id is not in the character table
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),
    /// A data file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A data file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors related to spending a monster's resources
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonsterError {
    /// Not enough energy to pay the ability cost
    #[error("{ability} needs {required} energy but only {available} is left")]
    InsufficientEnergy {
        ability: String,
        required: u32,
        available: u32,
    },
    /// The ability is not unlocked at the monster's current level
    #[error("{ability} is not unlocked at level {level}")]
    AbilityLocked { ability: String, level: u32 },
}

/// Errors related to battle actions. Returned before any state is mutated,
/// so the caller can re-prompt the actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// Ability id is not in the ability table
    #[error("Unknown ability: {0}")]
    UnknownAbility(String),
    /// The acting monster cannot pay for the ability
    #[error("Insufficient energy for {ability}: need {required}, have {available}")]
    InsufficientEnergy {
        ability: String,
        required: u32,
        available: u32,
    },
    /// The ability is known to the species but not unlocked yet
    #[error("{ability} is not unlocked at level {level}")]
    AbilityLocked { ability: String, level: u32 },
    /// The acting monster has fainted
    #[error("The monster in slot {0} has fainted and cannot act")]
    ActorFainted(usize),
    /// Switch target is missing, fainted or already active
    #[error("Invalid switch target: slot {0}")]
    InvalidSwitchTarget(usize),
    /// Fleeing is only possible from wild encounters
    #[error("Cannot flee from a trainer battle")]
    CannotFlee,
    /// The battle has already reached a terminal state
    #[error("The battle is already over")]
    BattleOver,
    /// A side has no active monster when one was expected
    #[error("Side {0} has no active monster")]
    NoActiveMonster(usize),
    /// Turn resolution was requested before both actions were queued
    #[error("Side {0} has not chosen an action")]
    MissingAction(usize),
    /// A battle was requested with a roster that has no healthy monster
    #[error("Side {0} has no monster able to fight")]
    EmptyRoster(usize),
    /// A replacement was required but the chosen action was not a switch
    #[error("Side {0} must switch in a replacement")]
    ReplacementRequired(usize),
}

impl From<MonsterError> for BattleError {
    fn from(err: MonsterError) -> Self {
        match err {
            MonsterError::InsufficientEnergy {
                ability,
                required,
                available,
            } => BattleError::InsufficientEnergy {
                ability,
                required,
                available,
            },
            MonsterError::AbilityLocked { ability, level } => {
                BattleError::AbilityLocked { ability, level }
            }
        }
    }
}

/// Errors related to save files. Never fatal: callers log and keep the
/// current in-memory state.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The save file could not be read or written
    #[error("Save file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Missing or garbled keys, or references to unknown static data
    #[error("Malformed save: {0}")]
    MalformedSave(String),
    /// The player's roster is owned by a running battle
    #[error("Cannot save or load while a battle is running")]
    InBattle,
}

/// Type alias for Results using GameError
pub type GameResult<T> = Result<T, GameError>;

/// Type alias for Results using DataError
pub type DataResult<T> = Result<T, DataError>;

/// Type alias for Results using BattleError
pub type BattleResult<T> = Result<T, BattleError>;

/// Type alias for Results using SaveError
pub type SaveResult<T> = Result<T, SaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monster_error_converts_to_battle_error() {
        let err = MonsterError::InsufficientEnergy {
            ability: "fire".to_string(),
            required: 15,
            available: 3,
        };
        assert_eq!(
            BattleError::from(err),
            BattleError::InsufficientEnergy {
                ability: "fire".to_string(),
                required: 15,
                available: 3,
            }
        );
    }

    #[test]
    fn test_error_messages() {
        let err: GameError = DataError::InvalidSpecies("Missingno".to_string()).into();
        assert_eq!(err.to_string(), "Data error: Invalid species: Missingno");

        let err: GameError = BattleError::CannotFlee.into();
        assert_eq!(err.to_string(), "Battle error: Cannot flee from a trainer battle");
    }
}
