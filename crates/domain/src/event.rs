//! Structured, append-only event record (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::damage::DamageType;
use crate::ids::CombatantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AttackRolled,
    DamageDealt,
    Miss,
    SpellCast,
    SlotConsumed,
    MoveResolved,
    SkillChecked,
    GenericActionTaken,
    ConditionApplied,
    ConditionRemoved,
    CombatantDown,
    CombatEnded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub actor_id: CombatantId,
    pub target_id: Option<CombatantId>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub round: u32,
    pub turn_index: usize,
    pub event_index: u64,
}

impl Event {
    /// `timestamp` comes from an injected clock, never from an inline
    /// `Utc::now()` call - spec §8 requires two `process` runs from the
    /// same seed to yield byte-identical `PipelineResult`s, which a
    /// wall-clock read taken at construction time would break.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: EventKind,
        actor_id: CombatantId,
        target_id: Option<CombatantId>,
        payload: Value,
        timestamp: DateTime<Utc>,
        round: u32,
        turn_index: usize,
        event_index: u64,
    ) -> Self {
        Self {
            kind,
            actor_id,
            target_id,
            payload,
            timestamp,
            round,
            turn_index,
            event_index,
        }
    }

    /// Builds an `attack_rolled` payload including the supplemented
    /// advantage/disadvantage source field (SPEC_FULL §3).
    #[allow(clippy::too_many_arguments)]
    pub fn attack_rolled(
        actor_id: CombatantId,
        target_id: CombatantId,
        total: i32,
        vs_ac: i32,
        hit: bool,
        critical: bool,
        fumble: bool,
        advantage_source: Option<&'static str>,
        timestamp: DateTime<Utc>,
        round: u32,
        turn_index: usize,
        event_index: u64,
    ) -> Self {
        Self::new(
            EventKind::AttackRolled,
            actor_id,
            Some(target_id),
            serde_json::json!({
                "total": total,
                "vs_ac": vs_ac,
                "hit": hit,
                "critical": critical,
                "fumble": fumble,
                "advantage_source": advantage_source,
            }),
            timestamp,
            round,
            turn_index,
            event_index,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn damage_dealt(
        actor_id: CombatantId,
        target_id: CombatantId,
        amount: i32,
        damage_type: DamageType,
        timestamp: DateTime<Utc>,
        round: u32,
        turn_index: usize,
        event_index: u64,
    ) -> Self {
        Self::new(
            EventKind::DamageDealt,
            actor_id,
            Some(target_id),
            serde_json::json!({ "amount": amount, "damage_type": damage_type }),
            timestamp,
            round,
            turn_index,
            event_index,
        )
    }

    #[cfg(test)]
    pub fn test_stub() -> Self {
        Self::new(
            EventKind::MoveResolved,
            CombatantId::new(),
            None,
            serde_json::json!({}),
            DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            1,
            0,
            0,
        )
    }
}
