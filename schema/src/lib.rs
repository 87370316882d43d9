// Monster Adventure Schema - Shared static data definitions
// This crate contains the element, stat, species and ability records that are
// loaded from the RON tables at startup and shared read-only by every module
// of the main `monster-adventure` crate.

// Re-export the main types
pub use battle_data::*;
pub use element_types::*;
pub use species_data::*;

pub mod battle_data;
pub mod element_types;
pub mod species_data;
