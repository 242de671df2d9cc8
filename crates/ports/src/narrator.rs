//! Narrator callback (spec §6, §9): structured events -> optional prose.
//! A capability, not a dependency - the engine's narration adapter must
//! function with no implementation supplied (spec §9).

use turnforge_domain::event::Event;
use turnforge_domain::scene::SceneContext;

/// Synchronous per spec §5 ("no suspension points visible to the
/// player" - `process` runs to completion before returning). An
/// implementation that talks to a real LLM is expected to block on its
/// own network call and enforce the §5 wall-clock deadline internally,
/// or be wrapped by the engine's `DeadlineNarrator` adapter.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait NarratorPort: Send + Sync {
    fn narrate(&self, events: &[Event], context: &SceneContext) -> Result<String, String>;
}
