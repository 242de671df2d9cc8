//! Scene context passed into the normalizer, validator, and narrator
//! (spec §4.4): the per-turn snapshot of what the acting combatant can
//! see and do, read-only from all three.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ids::CombatantId;

/// A selectable candidate surfaced in a `NeedsClarification` result
/// (spec §3 `PipelineResult`, §6 stable-id options).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneOption {
    pub id: CombatantId,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneContext {
    pub actor: CombatantId,
    pub primary_weapon: Option<String>,
    pub secondary_weapon: Option<String>,
    pub available_weapons: Vec<String>,
    pub known_spells: Vec<String>,
    /// Spell level -> slots remaining, mirrors `CharacterCurrent::spell_slots_remaining`.
    pub available_slots: HashMap<u8, u32>,
    pub living_enemies: Vec<SceneOption>,
    pub allies: Vec<SceneOption>,
    pub movement_remaining: f32,
    pub action_available: bool,
    pub bonus_available: bool,
    /// Precomputed attack-roll bonus for the acting combatant this turn
    /// (ability mod + proficiency + weapon bonus), so the executor never
    /// re-derives rule primitives the caller's character layer already
    /// resolved. Same rationale as `known_spells`/`available_slots` above.
    pub attack_bonus: i32,
    /// Flat bonus added to weapon/unarmed damage rolls (typically the
    /// same ability mod folded into `attack_bonus`).
    pub damage_bonus: i32,
    pub spell_attack_bonus: Option<i32>,
    pub spell_save_dc: Option<i32>,
    /// Skill name (closed set, spec §4.4(c)) -> total check bonus.
    pub skill_bonuses: HashMap<String, i32>,
}

impl SceneContext {
    pub fn single_living_enemy(&self) -> Option<&SceneOption> {
        match self.living_enemies.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
