//! Character persistence boundary (spec §6: "Character repository:
//! load/save character records conforming to §3"). Out of scope per
//! spec §1 ("persistence of characters/worlds (injected repository
//! interface)") - this crate only defines the trait external code
//! implements.

use thiserror::Error;
use uuid::Uuid;

use turnforge_domain::character::Character;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("character not found: {0}")]
    NotFound(Uuid),
    #[error("persistence backend error: {0}")]
    Backend(String),
    #[error("schema version {found} is not understood (expected {expected})")]
    UnsupportedSchemaVersion { found: u32, expected: u32 },
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CharacterRepository: Send + Sync {
    fn load(&self, id: Uuid) -> Result<Character, RepositoryError>;
    fn save(&self, character: &Character) -> Result<(), RepositoryError>;
}
