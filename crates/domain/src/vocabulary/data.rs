//! Static vocabulary tables (spec §9: "a data table, not code"). Adding a
//! synonym here must never require touching the normalizer.

use super::{GenericActionId, VerbIntent};

/// Verb/synonym → intent kind (spec §4.4 step (d)). Spanish-first, since
/// the worked examples in spec §8 are Spanish; a handful of English verbs
/// are included for players who mix languages at the table.
pub const VERB_INTENTS: &[(&str, VerbIntent)] = &[
    ("atacar", VerbIntent::Attack),
    ("ataco", VerbIntent::Attack),
    ("golpear", VerbIntent::Attack),
    ("golpeo", VerbIntent::Attack),
    ("apuñalar", VerbIntent::Attack),
    ("disparar", VerbIntent::Attack),
    ("disparo", VerbIntent::Attack),
    ("atack", VerbIntent::Attack),
    ("attack", VerbIntent::Attack),
    ("lanzar", VerbIntent::Spell),
    ("lanzo", VerbIntent::Spell),
    ("conjurar", VerbIntent::Spell),
    ("conjuro", VerbIntent::Spell),
    ("cast", VerbIntent::Spell),
    ("mover", VerbIntent::Move),
    ("muevo", VerbIntent::Move),
    ("avanzar", VerbIntent::Move),
    ("avanzo", VerbIntent::Move),
    ("correr", VerbIntent::Move),
    ("corro", VerbIntent::Move),
    ("retroceder", VerbIntent::Move),
    ("acercarme", VerbIntent::Move),
    ("move", VerbIntent::Move),
    ("intentar", VerbIntent::Skill),
    ("intento", VerbIntent::Skill),
    ("escuchar", VerbIntent::Skill),
    ("escucho", VerbIntent::Skill),
    ("buscar", VerbIntent::Skill),
    ("busco", VerbIntent::Skill),
    ("trepar", VerbIntent::Skill),
    ("trepo", VerbIntent::Skill),
    ("persuadir", VerbIntent::Skill),
    ("persuado", VerbIntent::Skill),
    ("beber", VerbIntent::UseItem),
    ("bebo", VerbIntent::UseItem),
    ("tomar", VerbIntent::UseItem),
    ("tomo", VerbIntent::UseItem),
    ("usar", VerbIntent::UseItem),
    ("uso", VerbIntent::UseItem),
];

/// Closed skill set from spec §4.4 step (c). Order is not significant.
pub const SKILL_NAMES: &[&str] = &[
    "acrobacias",
    "arcanos",
    "atletismo",
    "engaño",
    "historia",
    "interpretacion",
    "intimidacion",
    "investigacion",
    "juego_manos",
    "medicina",
    "naturaleza",
    "percepcion",
    "perspicacia",
    "persuasion",
    "religion",
    "sigilo",
    "supervivencia",
    "trato_animales",
];

/// Generic action phrases from spec §4.4 step (a).
pub const GENERIC_ACTION_PHRASES: &[(&str, GenericActionId)] = &[
    ("dash", GenericActionId::Dash),
    ("correr con todo", GenericActionId::Dash),
    ("dodge", GenericActionId::Dodge),
    ("esquivar", GenericActionId::Dodge),
    ("esquivo", GenericActionId::Dodge),
    ("disengage", GenericActionId::Disengage),
    ("desenganchar", GenericActionId::Disengage),
    ("desenganchar me", GenericActionId::Disengage),
    ("retirada táctica", GenericActionId::Disengage),
    ("help", GenericActionId::Help),
    ("ayudar", GenericActionId::Help),
    ("ayudo", GenericActionId::Help),
    ("hide", GenericActionId::Hide),
    ("esconderme", GenericActionId::Hide),
    ("me escondo", GenericActionId::Hide),
    ("search", GenericActionId::Search),
    ("registrar", GenericActionId::Search),
    ("inspeccionar", GenericActionId::Search),
    ("ready", GenericActionId::Ready),
    ("preparar", GenericActionId::Ready),
    ("preparo una accion", GenericActionId::Ready),
];

/// Verbs/phrases that imply an unarmed attack (spec §4.4 step 3).
pub const UNARMED_KEYWORDS: &[&str] = &["puño", "puños", "patada", "golpe sin arma", "unarmed"];

/// Verb → skill hint for verbs whose `VerbIntent::Skill` match already
/// implies which skill is meant (spec §8 worked example 4: "escuchar"
/// implies `percepcion` at confidence ≥ 0.85 without a literal skill-name
/// match). "intentar"/"intento" carry no hint; they only narrow to Skill
/// intent and still need a name match or LLM fallback.
pub const VERB_SKILL_HINTS: &[(&str, &str)] = &[
    ("escuchar", "percepcion"),
    ("escucho", "percepcion"),
    ("buscar", "investigacion"),
    ("busco", "investigacion"),
    ("trepar", "atletismo"),
    ("trepo", "atletismo"),
    ("persuadir", "persuasion"),
    ("persuado", "persuasion"),
];

/// Verbs/phrases implying a skill-check utterance independent of a specific
/// skill (e.g. "intento" alone signals Skill intent even before a skill
/// name is matched) are covered by `VERB_INTENTS` above; this table is
/// kept separate to flag words that should never resolve to an attack even
/// though they share a verb root with combat vocabulary (e.g. "tomo
/// posicion" is a Move, not a UseItem, despite "tomo" appearing above).
pub const VERB_OVERRIDES: &[(&str, VerbIntent)] = &[("tomo posicion", VerbIntent::Move)];
