//! Compendium content schema (spec §3, §4.3, §6). Entries are immutable,
//! shared, read-only data; `Instance` is the mutable materialized copy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::damage::DamageType;
use crate::ids::InstanceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Weapon,
    Armor,
    Shield,
    Spell,
    Monster,
    Item,
}

/// §9: resistances/immunities/vulnerabilities, recharge, regeneration,
/// advantage/disadvantage modifiers, special senses - the MUST-PARSE tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MustParseTraits {
    pub resistances: Vec<DamageType>,
    pub vulnerabilities: Vec<DamageType>,
    pub immunities: Vec<DamageType>,
    pub condition_immunities: Vec<String>,
    pub recharge: Option<RechargeRule>,
    pub regeneration: Option<i32>,
    pub advantage_on: Vec<String>,
    pub disadvantage_on: Vec<String>,
    pub senses: Vec<Sense>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RechargeRule {
    /// Recharges on a d6 roll of `min..=6`.
    pub min: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sense {
    pub name: String,
    pub range_ft: i32,
}

/// §9 TEXT-ONLY tier: original trait text plus tags for future parsing.
/// The pipeline must tolerate this tier without crashing - i.e. it is
/// never consulted for mechanical decisions, only surfaced in narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOnlyTrait {
    pub name: String,
    pub text: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponEntry {
    pub key: String,
    pub nombre: String,
    pub peso: f32,
    pub descripcion: String,
    pub damage: String,
    pub damage_type: DamageType,
    pub properties: Vec<String>,
    pub reach_ft: i32,
    pub range_ft: Option<i32>,
    pub is_magical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmorEntry {
    pub key: String,
    pub nombre: String,
    pub peso: f32,
    pub descripcion: String,
    pub base_ac: i32,
    pub max_dex_cap: Option<i32>,
    pub is_magical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldEntry {
    pub key: String,
    pub nombre: String,
    pub peso: f32,
    pub descripcion: String,
    pub ac_bonus: i32,
    pub is_magical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellEntry {
    pub key: String,
    pub nombre: String,
    pub descripcion: String,
    pub nivel: u8,
    pub objetivo: SpellTarget,
    pub range_ft: Option<i32>,
    pub daño: Option<String>,
    pub damage_type: Option<DamageType>,
    /// §4.7 step 4: "damage/save resolution follows the spell's record
    /// from compendium (attack roll, save DC, ...)" - this flag picks
    /// between the two resolution paths the executor supports.
    pub requires_attack_roll: bool,
    pub escalado: Option<String>,
    pub half_on_save: bool,
    pub save_ability: Option<String>,
    pub is_magical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellTarget {
    SingleCreature,
    MultipleCreatures,
    SelfOnly,
    AreaOfEffect,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterAction {
    pub name: String,
    pub to_hit: Option<i32>,
    pub damage: Option<String>,
    pub damage_type: Option<DamageType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterEntry {
    pub key: String,
    pub nombre: String,
    pub peso: f32,
    pub descripcion: String,
    pub cr: f32,
    pub xp: i32,
    pub hp_max: i32,
    pub ac: i32,
    pub speed_ft: i32,
    pub abilities: HashMap<String, i32>,
    pub actions: Vec<MonsterAction>,
    pub must_parse: MustParseTraits,
    pub text_only: Vec<TextOnlyTrait>,
    pub is_magical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub key: String,
    pub nombre: String,
    pub peso: f32,
    pub descripcion: String,
    pub charges_max: Option<i32>,
    /// Dice expression for items that restore HP on use (e.g. a potion).
    pub heals: Option<String>,
    /// Condition cured on use, if any (e.g. an antitoxin curing poisoned).
    pub cures_condition: Option<crate::conditions::ConditionKind>,
    pub is_magical: bool,
}

/// A materialized copy of a compendium entry, uniquely identified within
/// a save. §3 invariant: every instance has `instance_id` and either a
/// `compendium_ref` or `None` (unique/custom).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: InstanceId,
    pub compendium_ref: Option<String>,
    pub kind: ContentCategory,
    pub data: InstanceData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstanceData {
    Weapon {
        damage: String,
        damage_type: DamageType,
        properties: Vec<String>,
        magic_bonus: Option<i32>,
    },
    Armor {
        base_ac: i32,
        max_dex_cap: Option<i32>,
    },
    Shield {
        ac_bonus: i32,
    },
    Spell {
        nivel: u8,
        objetivo: SpellTarget,
    },
    Monster {
        hp_max: i32,
        hp_current: i32,
        ac: i32,
        abilities: HashMap<String, i32>,
        actions: Vec<MonsterAction>,
        traits_text: Vec<String>,
        speed_ft: i32,
        conditions: crate::conditions::ConditionSet,
    },
    Item {
        charges: Option<i32>,
    },
}
