//! Turnforge domain layer: the data model (spec §3), dice/RNG (§4.1),
//! rule primitives (§4.2), compendium content schema (§4.3), condition
//! bookkeeping, damage typing, and the vocabulary tables the normalizer
//! reads (§9). No I/O, no trait objects for external collaborators -
//! pure data and pure functions plus the seeded dice engine.

pub mod canonical_action;
pub mod character;
pub mod combat_state;
pub mod combat_summary;
pub mod combatant;
pub mod compendium;
pub mod conditions;
pub mod damage;
pub mod dice;
pub mod error;
pub mod event;
pub mod ids;
pub mod pipeline_result;
pub mod rules;
pub mod scene;
pub mod validation;
pub mod vocabulary;

pub use error::DomainError;
