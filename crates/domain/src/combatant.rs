//! Per-combat combatant record (spec §3).

use serde::{Deserialize, Serialize};

use crate::conditions::ConditionSet;
use crate::ids::CombatantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantCategory {
    Player,
    Ally,
    Enemy,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub instance_id: CombatantId,
    pub display_name: String,
    pub initiative: i32,
    pub dex_mod: i32,
    pub hp_current: i32,
    pub hp_max: i32,
    pub hp_temp: i32,
    pub ac: i32,
    pub speed_ft: i32,
    pub conditions: ConditionSet,
    pub es_su_turno: bool,
    pub category: CombatantCategory,
    pub compendium_ref: Option<String>,
    /// PC-only down-state bookkeeping (spec §3, §4.6). Enemies skip death
    /// saves entirely - `apply_action` marks them `dead` directly at 0 HP.
    pub unconscious: bool,
    pub stable: bool,
    pub dead: bool,
    pub death_save_successes: u8,
    pub death_save_failures: u8,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        !self.dead && self.hp_current > 0
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.category, CombatantCategory::Enemy)
    }

    pub fn is_pc(&self) -> bool {
        matches!(self.category, CombatantCategory::Player)
    }

    /// §4.5 `can_act` predicate, applied at the combatant level: dead,
    /// unconscious, zero HP, or an incapacitating condition all block it.
    pub fn can_act(&self) -> bool {
        if self.dead || self.unconscious || self.hp_current <= 0 {
            return false;
        }
        !self.conditions.any_blocks_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample() -> Combatant {
        Combatant {
            instance_id: CombatantId::from(Uuid::new_v4()),
            display_name: "Orco".to_string(),
            initiative: 14,
            dex_mod: 1,
            hp_current: 15,
            hp_max: 15,
            hp_temp: 0,
            ac: 13,
            speed_ft: 30,
            conditions: ConditionSet::new(),
            es_su_turno: false,
            category: CombatantCategory::Enemy,
            compendium_ref: Some("orc".to_string()),
            unconscious: false,
            stable: false,
            dead: false,
            death_save_successes: 0,
            death_save_failures: 0,
        }
    }

    #[test]
    fn alive_combatant_with_positive_hp() {
        assert!(sample().is_alive());
    }

    #[test]
    fn zero_hp_combatant_cannot_act() {
        let mut c = sample();
        c.hp_current = 0;
        assert!(!c.can_act());
    }

    #[test]
    fn enemy_and_pc_classification() {
        let enemy = sample();
        assert!(enemy.is_enemy());
        assert!(!enemy.is_pc());
    }
}
