//! `CanonicalAction` (spec §3, §6): the tagged, kind-specific record the
//! normalizer produces and the validator/pipeline consume.

use serde::{Deserialize, Serialize};

use crate::dice::Mode;
use crate::ids::CombatantId;
use crate::vocabulary::GenericActionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Pattern,
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackSubtype {
    Melee,
    Ranged,
    Unarmed,
}

/// Field names used for §4.4 step 6's critical-set test and for the
/// normalizer's `missing_fields` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    TargetId,
    WeaponId,
    SpellId,
    Skill,
    ActionId,
    ItemId,
}

/// Kind-specific payloads, one variant per §6 wire format entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ActionData {
    Attack {
        attacker_id: CombatantId,
        target_id: Option<CombatantId>,
        weapon_id: Option<String>,
        subtype: AttackSubtype,
        mode: Mode,
    },
    Spell {
        caster_id: CombatantId,
        target_id: Option<CombatantId>,
        spell_id: Option<String>,
        casting_level: Option<u8>,
    },
    Move {
        actor_id: CombatantId,
        distance_feet: f32,
        destination: Option<String>,
    },
    Skill {
        actor_id: CombatantId,
        skill: Option<String>,
        target_id: Option<CombatantId>,
    },
    GenericAction {
        actor_id: CombatantId,
        action_id: Option<GenericActionId>,
    },
    UseItem {
        actor_id: CombatantId,
        item_id: Option<String>,
    },
    Unknown {
        actor_id: CombatantId,
    },
}

impl ActionData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ActionData::Attack { .. } => "attack",
            ActionData::Spell { .. } => "spell",
            ActionData::Move { .. } => "move",
            ActionData::Skill { .. } => "skill",
            ActionData::GenericAction { .. } => "generic_action",
            ActionData::UseItem { .. } => "use_item",
            ActionData::Unknown { .. } => "unknown",
        }
    }

    pub fn actor_id(&self) -> CombatantId {
        match self {
            ActionData::Attack { attacker_id, .. } => *attacker_id,
            ActionData::Spell { caster_id, .. } => *caster_id,
            ActionData::Move { actor_id, .. } => *actor_id,
            ActionData::Skill { actor_id, .. } => *actor_id,
            ActionData::GenericAction { actor_id, .. } => *actor_id,
            ActionData::UseItem { actor_id, .. } => *actor_id,
            ActionData::Unknown { actor_id } => *actor_id,
        }
    }

    /// §4.4 step 6 critical sets: Attack->{target_id}; Spell->{spell_id};
    /// Move->{}; Skill->{skill}; GenericAction->{action_id};
    /// UseItem->{item_id}.
    pub fn critical_set(&self) -> &'static [MissingField] {
        match self {
            ActionData::Attack { .. } => &[MissingField::TargetId],
            ActionData::Spell { .. } => &[MissingField::SpellId],
            ActionData::Move { .. } => &[],
            ActionData::Skill { .. } => &[MissingField::Skill],
            ActionData::GenericAction { .. } => &[MissingField::ActionId],
            ActionData::UseItem { .. } => &[MissingField::ItemId],
            ActionData::Unknown { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalAction {
    #[serde(flatten)]
    pub data: ActionData,
    pub confidence: f32,
    pub missing_fields: Vec<MissingField>,
    pub warnings: Vec<String>,
    pub original_text: String,
    pub needs_clarification: bool,
    pub source: ActionSource,
}

impl CanonicalAction {
    pub fn new(data: ActionData, original_text: impl Into<String>, seed_confidence: f32) -> Self {
        Self {
            data,
            confidence: seed_confidence.clamp(0.0, 1.0),
            missing_fields: Vec::new(),
            warnings: Vec::new(),
            original_text: original_text.into(),
            needs_clarification: false,
            source: ActionSource::Pattern,
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn bump_confidence(&mut self, delta: f32) {
        self.confidence = (self.confidence + delta).min(1.0);
    }

    /// §4.4 step 6: `needs_clarification` is true iff the intersection of
    /// `missing_fields` with the kind's critical set is non-empty.
    pub fn recompute_needs_clarification(&mut self) {
        let critical = self.data.critical_set();
        self.needs_clarification = self
            .missing_fields
            .iter()
            .any(|field| critical.contains(field));
    }
}

/// Input to the optional normalizer LLM fallback (spec §4.4 step 5): the
/// original text, the partially-filled action, and what is still missing.
/// Built by the normalizer, consumed by `NormalizerLlmPort`; the callback
/// must return a JSON object containing only the fields it is asked to
/// fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerPrompt {
    pub original_text: String,
    pub detected_kind: &'static str,
    pub partial: ActionData,
    pub missing_fields: Vec<MissingField>,
    pub scene_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_missing_target_needs_clarification() {
        let mut action = CanonicalAction::new(
            ActionData::Attack {
                attacker_id: CombatantId::new(),
                target_id: None,
                weapon_id: Some("long_sword".into()),
                subtype: AttackSubtype::Melee,
                mode: Mode::Normal,
            },
            "Ataco",
            0.6,
        );
        action.missing_fields.push(MissingField::TargetId);
        action.recompute_needs_clarification();
        assert!(action.needs_clarification);
    }

    #[test]
    fn move_has_no_critical_fields() {
        let mut action = CanonicalAction::new(
            ActionData::Move {
                actor_id: CombatantId::new(),
                distance_feet: 0.0,
                destination: None,
            },
            "Avanzo",
            0.5,
        );
        action.recompute_needs_clarification();
        assert!(!action.needs_clarification);
    }

    #[test]
    fn bump_confidence_caps_at_one() {
        let mut action = CanonicalAction::new(
            ActionData::Unknown {
                actor_id: CombatantId::new(),
            },
            "???",
            0.95,
        );
        action.bump_confidence(0.5);
        assert_eq!(action.confidence, 1.0);
    }
}
