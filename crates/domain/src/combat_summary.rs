//! Combat termination outcome and summary (spec §4.6, §6: "Combat summary
//! at termination: outcome, XP total, survivors, dead list").

use serde::{Deserialize, Serialize};

use crate::ids::CombatantId;

/// Exactly one holds after every `apply_action` (spec §4.6, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Flee,
    Ongoing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSummary {
    pub outcome: CombatOutcome,
    pub xp_total: i32,
    pub survivors: Vec<CombatantId>,
    pub dead: Vec<CombatantId>,
}

/// A point-in-time snapshot of whose turn it is and what economy remains
/// (spec §4.6 `current_turn()`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInfo {
    pub combatant_id: CombatantId,
    pub round: u32,
    pub turn_index: usize,
    pub economy: crate::combat_state::TurnEconomy,
}
