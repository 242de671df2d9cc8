//! Normalizer LLM fallback (spec §4.4 step 5, §6, §9): fills missing
//! canonical-action fields when the pattern-first pipeline can't. A
//! capability, not a dependency - the normalizer must work with none
//! supplied (spec §9).

use turnforge_domain::canonical_action::NormalizerPrompt;

/// Synchronous per spec §5; callers needing a deadline should wrap an
/// implementation in the engine's `DeadlineNormalizerLlm` adapter. Errors
/// are caught by the normalizer and appended to `warnings` - the action is
/// never discarded because of an `Err` here (spec §4.4 step 5).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait NormalizerLlmPort: Send + Sync {
    fn fill(&self, prompt: NormalizerPrompt) -> Result<serde_json::Value, String>;
}
