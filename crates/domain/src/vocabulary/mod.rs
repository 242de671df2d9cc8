//! Vocabulary tables driving normalizer intent detection (spec §4.4(d),
//! §9 "vocabulary growth": data, not code).

pub mod data;

use serde::{Deserialize, Serialize};

pub use data::{
    GENERIC_ACTION_PHRASES, SKILL_NAMES, UNARMED_KEYWORDS, VERB_INTENTS, VERB_OVERRIDES,
    VERB_SKILL_HINTS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbIntent {
    Attack,
    Spell,
    Move,
    Skill,
    UseItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericActionId {
    Dash,
    Dodge,
    Disengage,
    Help,
    Hide,
    Search,
    Ready,
}

/// Linear scan over `VERB_OVERRIDES` then `VERB_INTENTS`; tables are small
/// enough that a hashmap would only add startup cost (spec §9).
pub fn lookup_verb(word: &str) -> Option<VerbIntent> {
    VERB_OVERRIDES
        .iter()
        .chain(VERB_INTENTS.iter())
        .find(|(verb, _)| *verb == word)
        .map(|(_, intent)| *intent)
}

pub fn lookup_generic_action(phrase: &str) -> Option<GenericActionId> {
    GENERIC_ACTION_PHRASES
        .iter()
        .find(|(p, _)| *p == phrase)
        .map(|(_, id)| *id)
}

pub fn is_known_skill(name: &str) -> bool {
    SKILL_NAMES.contains(&name)
}

pub fn is_unarmed_keyword(word: &str) -> bool {
    UNARMED_KEYWORDS.contains(&word)
}

pub fn lookup_skill_hint(word: &str) -> Option<&'static str> {
    VERB_SKILL_HINTS
        .iter()
        .find(|(verb, _)| *verb == word)
        .map(|(_, skill)| *skill)
}
