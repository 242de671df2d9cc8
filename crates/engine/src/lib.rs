//! Turnforge engine: the compendium adapter, normalizer, validator,
//! combat manager, and turn pipeline that implement the ports crate's
//! trait boundary against the domain data model.

pub mod clock;
pub mod combat_manager;
pub mod compendium_adapter;
pub mod narration;
pub mod normalizer;
pub mod pipeline;
pub mod validator;
pub mod xp;

pub use clock::SystemClock;
pub use combat_manager::CombatManager;
pub use compendium_adapter::CompendiumAdapter;
pub use normalizer::Normalizer;
pub use pipeline::{TurnInputs, TurnPipeline};
pub use validator::Validator;
