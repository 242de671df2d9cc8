//! Character data model (spec §3): strictly separated `source` /
//! `derived` / `current` regions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::conditions::ConditionSet;

/// Player-chosen facts. Mutated only by level-up or explicit equip/learn
/// actions - never touched by combat resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSource {
    pub ability_scores: HashMap<String, i32>,
    pub race: String,
    pub class: String,
    pub level: u8,
    pub background: String,
    pub equipped_ids: Vec<String>,
    pub known_spells: Vec<String>,
    pub prepared_spells: Vec<String>,
    pub proficiencies: Vec<String>,
    pub expertise: Vec<String>,
}

/// Recomputed from `source`. Invariant: a pure function of `source`; any
/// mutation to `source` invalidates this until recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDerived {
    pub final_ability_scores: HashMap<String, i32>,
    pub modifiers: HashMap<String, i32>,
    pub proficiency_bonus: i32,
    pub ac: i32,
    pub initiative_mod: i32,
    pub hp_max: i32,
    pub skill_totals: HashMap<String, i32>,
    pub spell_save_dc: Option<i32>,
    pub spell_attack_bonus: Option<i32>,
    pub recomputed_at: DateTime<Utc>,
}

/// Mutable play state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterCurrent {
    pub hp_current: i32,
    pub hp_temp: i32,
    pub conditions: ConditionSet,
    pub unconscious: bool,
    pub stable: bool,
    pub dead: bool,
    pub death_save_successes: u8,
    pub death_save_failures: u8,
    pub spell_slots_remaining: HashMap<u8, u32>,
    pub hit_dice_remaining: u32,
    pub xp: i32,
}

impl CharacterCurrent {
    /// §3 invariant: `0 <= hp_current <= hp_max + hp_temp`.
    pub fn clamp_hp(&mut self, hp_max: i32) {
        self.hp_current = self.hp_current.clamp(0, hp_max + self.hp_temp);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub name: String,
    pub source: CharacterSource,
    pub derived: CharacterDerived,
    pub current: CharacterCurrent,
}

impl Character {
    /// §3: dead/unconscious/an incapacitating condition all block acting.
    pub fn can_act(&self) -> bool {
        if self.current.dead || self.current.unconscious {
            return false;
        }
        if self.current.hp_current <= 0 {
            return false;
        }
        !self.current.conditions.any_blocks_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_character() -> Character {
        Character {
            id: Uuid::new_v4(),
            name: "Thorin".to_string(),
            source: CharacterSource {
                ability_scores: HashMap::new(),
                race: "Dwarf".to_string(),
                class: "Fighter".to_string(),
                level: 3,
                background: "Soldier".to_string(),
                equipped_ids: vec!["long_sword".to_string()],
                known_spells: vec![],
                prepared_spells: vec![],
                proficiencies: vec![],
                expertise: vec![],
            },
            derived: CharacterDerived {
                final_ability_scores: HashMap::new(),
                modifiers: HashMap::new(),
                proficiency_bonus: 2,
                ac: 16,
                initiative_mod: 1,
                hp_max: 28,
                skill_totals: HashMap::new(),
                spell_save_dc: None,
                spell_attack_bonus: None,
                recomputed_at: Utc::now(),
            },
            current: CharacterCurrent {
                hp_current: 28,
                hp_temp: 0,
                conditions: ConditionSet::new(),
                unconscious: false,
                stable: false,
                dead: false,
                death_save_successes: 0,
                death_save_failures: 0,
                spell_slots_remaining: HashMap::new(),
                hit_dice_remaining: 3,
                xp: 0,
            },
        }
    }

    #[test]
    fn healthy_character_can_act() {
        assert!(sample_character().can_act());
    }

    #[test]
    fn dead_character_cannot_act() {
        let mut character = sample_character();
        character.current.dead = true;
        assert!(!character.can_act());
    }

    #[test]
    fn zero_hp_character_cannot_act() {
        let mut character = sample_character();
        character.current.hp_current = 0;
        assert!(!character.can_act());
    }

    #[test]
    fn clamp_hp_respects_temp_hp() {
        let mut current = sample_character().current;
        current.hp_temp = 5;
        current.hp_current = 999;
        current.clamp_hp(28);
        assert_eq!(current.hp_current, 33);
        current.hp_current = -10;
        current.clamp_hp(28);
        assert_eq!(current.hp_current, 0);
    }
}
