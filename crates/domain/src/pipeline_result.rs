//! `PipelineResult` (spec §3, §6): the tagged outcome of one `process`
//! call.

use serde::{Deserialize, Serialize};

use crate::conditions::ConditionKind;
use crate::event::Event;
use crate::ids::CombatantId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationOption {
    pub id: String,
    pub text: String,
}

/// What a pipeline's `Applied` result asks the combat manager to apply.
/// §4.7: "the pipeline never mutates the combat state directly - it asks
/// the combat manager to apply the delta."
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDelta {
    pub damage: Vec<(CombatantId, i32)>,
    /// Spell level -> slots consumed by the acting caster this turn.
    /// `spell_slots_remaining` lives on the character record outside
    /// `CombatState` (spec §1/§3: characters are owned by the caller's
    /// repository), so the combat manager does not decrement it here -
    /// it is surfaced for the caller's character layer to apply, the
    /// same handoff as `item_consumed` below.
    pub slots_consumed: Vec<(u8, u32)>,
    pub movement_used: f32,
    /// Extra movement granted this turn (`GenericAction::Dash` doubles
    /// the actor's remaining movement - SPEC_FULL §3).
    pub movement_bonus: f32,
    pub conditions_added: Vec<(CombatantId, ConditionKind)>,
    pub conditions_removed: Vec<(CombatantId, ConditionKind)>,
    pub hp_regained: Vec<(CombatantId, i32)>,
    /// Item key whose charge the acting combatant consumed, if any.
    /// Inventory itself lives outside `CombatState` (spec §1: persistence
    /// is an external collaborator), so the combat manager does not act
    /// on this - it is surfaced for the caller's repository to apply.
    pub item_consumed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PipelineResult {
    NeedsClarification {
        question: String,
        options: Vec<ClarificationOption>,
    },
    Rejected {
        code: String,
        reason: String,
        suggestion: Option<String>,
    },
    Applied {
        events: Vec<Event>,
        state_delta: StateDelta,
        narration: Option<String>,
    },
}

impl PipelineResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, PipelineResult::Applied { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, PipelineResult::Rejected { .. })
    }

    pub fn is_needs_clarification(&self) -> bool {
        matches!(self, PipelineResult::NeedsClarification { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_round_trip_is_a_fixed_point() {
        let result = PipelineResult::Rejected {
            code: "NO_SLOTS".to_string(),
            reason: "nivel 1".to_string(),
            suggestion: None,
        };
        let once = serde_json::to_value(&result).unwrap();
        let back: PipelineResult = serde_json::from_value(once.clone()).unwrap();
        let twice = serde_json::to_value(&back).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn kind_predicates() {
        assert!(PipelineResult::NeedsClarification {
            question: "?".into(),
            options: vec![],
        }
        .is_needs_clarification());
    }
}
