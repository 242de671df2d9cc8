//! Unified error types for the domain layer.

use thiserror::Error;

use crate::dice::DiceError;

/// Errors raised by pure domain-layer operations (dice, rule primitives,
/// compendium instance factory). Validator/normalizer/pipeline-level
/// failures are modeled as data (`Validation`, `CanonicalAction`,
/// `PipelineResult`), not as `Result` errors, per spec - only genuinely
/// exceptional conditions live here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("dice error: {0}")]
    Dice(#[from] DiceError),

    #[error("unknown compendium category: {0}")]
    UnknownCategory(String),

    #[error("entity not found: {entity_type} with key {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            key: key.into(),
        }
    }
}
