//! Validator (spec §4.5): per-action-kind legality checks over actor
//! state, target state, resources, equipment. Never mutates; returns a
//! `Validation` verdict for the pipeline to act on.

use std::collections::HashMap;

use turnforge_domain::canonical_action::ActionData;
use turnforge_domain::combat_state::{CombatState, TurnEconomy};
use turnforge_domain::combatant::Combatant;
use turnforge_domain::conditions::ConditionKind;
use turnforge_domain::ids::CombatantId;
use turnforge_domain::vocabulary;
use turnforge_domain::validation::{Validation, ValidationCode};
use turnforge_ports::CompendiumStore;

/// Per-kind legality checks (spec §4.5). `strict_equipment` toggles
/// whether an unequipped-but-compendium-known weapon rejects or merely
/// warns (spec §8 scenario 6).
pub struct Validator<'a> {
    compendium: &'a dyn CompendiumStore,
    strict_equipment: bool,
}

impl<'a> Validator<'a> {
    pub fn new(compendium: &'a dyn CompendiumStore) -> Self {
        Self {
            compendium,
            strict_equipment: false,
        }
    }

    pub fn with_strict_equipment(mut self, strict: bool) -> Self {
        self.strict_equipment = strict;
        self
    }

    /// Dispatches on `ActionData`'s kind (spec §9 "exhaustive case
    /// analysis"). `equipped_ids`/`known_spells`/`prepared_spells` come
    /// from the caller's character layer; `slots_remaining` from
    /// `SceneContext::available_slots`.
    #[allow(clippy::too_many_arguments)]
    pub fn validate(
        &self,
        action: &ActionData,
        state: &CombatState,
        equipped_ids: &[String],
        known_spells: &[String],
        prepared_spells: &[String],
        slots_remaining: &HashMap<u8, u32>,
    ) -> Validation {
        match action {
            ActionData::Attack {
                attacker_id,
                target_id,
                weapon_id,
                ..
            } => self.validate_attack(*attacker_id, *target_id, weapon_id.as_deref(), state, equipped_ids),
            ActionData::Spell {
                caster_id,
                target_id,
                spell_id,
                casting_level,
            } => self.validate_spell(
                *caster_id,
                *target_id,
                spell_id.as_deref(),
                *casting_level,
                state,
                known_spells,
                prepared_spells,
                slots_remaining,
            ),
            ActionData::Move {
                actor_id,
                distance_feet,
                ..
            } => self.validate_move(*actor_id, *distance_feet, state),
            ActionData::Skill {
                actor_id, skill, ..
            } => self.validate_skill(*actor_id, skill.as_deref(), state),
            ActionData::GenericAction { actor_id, action_id } => {
                self.validate_generic_action(*actor_id, *action_id, state)
            }
            ActionData::UseItem { actor_id, item_id } => {
                self.validate_use_item(*actor_id, item_id.as_deref(), state)
            }
            ActionData::Unknown { .. } => {
                Validation::reject(ValidationCode::Internal, "cannot validate an Unknown action")
            }
        }
    }

    fn combatant<'s>(&self, state: &'s CombatState, id: CombatantId) -> Option<&'s Combatant> {
        state.combatants.get(&id)
    }

    fn validate_attack(
        &self,
        attacker_id: CombatantId,
        target_id: Option<CombatantId>,
        weapon_id: Option<&str>,
        state: &CombatState,
        equipped_ids: &[String],
    ) -> Validation {
        let Some(actor) = self.combatant(state, attacker_id) else {
            return Validation::reject(ValidationCode::Internal, "attacker not in combat state");
        };
        if !actor.can_act() {
            return Validation::reject(ValidationCode::CannotAct, "actor cannot act");
        }
        let Some(target_id) = target_id else {
            return Validation::reject(ValidationCode::NoTarget, "no target specified");
        };
        let Some(target) = self.combatant(state, target_id) else {
            return Validation::reject(ValidationCode::NoTarget, "target not in combat state");
        };
        if !target.is_alive() {
            return Validation::reject(ValidationCode::TargetDead, "target is already dead");
        }

        let mut validation = Validation::ok();
        if let Some(weapon_id) = weapon_id {
            if weapon_id != "unarmed" {
                if self.compendium.weapon(weapon_id).is_none() {
                    return Validation::reject(
                        ValidationCode::WeaponNotFound,
                        format!("no such weapon: {weapon_id}"),
                    );
                }
                if !equipped_ids.iter().any(|id| id == weapon_id) {
                    if self.strict_equipment {
                        return Validation::reject(
                            ValidationCode::WeaponNotEquipped,
                            format!("{weapon_id} is not equipped"),
                        );
                    }
                    validation
                        .warnings
                        .push(format!("WEAPON_NOT_EQUIPPED: {weapon_id} is not equipped"));
                }
            }
        }
        validation
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_spell(
        &self,
        caster_id: CombatantId,
        target_id: Option<CombatantId>,
        spell_id: Option<&str>,
        casting_level: Option<u8>,
        state: &CombatState,
        known_spells: &[String],
        prepared_spells: &[String],
        slots_remaining: &HashMap<u8, u32>,
    ) -> Validation {
        let Some(actor) = self.combatant(state, caster_id) else {
            return Validation::reject(ValidationCode::Internal, "caster not in combat state");
        };
        if !actor.can_act() {
            return Validation::reject(ValidationCode::CannotAct, "actor cannot act");
        }
        let Some(spell_id) = spell_id else {
            return Validation::reject(ValidationCode::SpellNotFound, "no spell specified");
        };
        let Some(spell) = self.compendium.spell(spell_id) else {
            return Validation::reject(ValidationCode::SpellNotFound, format!("no such spell: {spell_id}"));
        };

        let mut validation = Validation::ok();
        if !known_spells.contains(&spell_id.to_string()) && !prepared_spells.contains(&spell_id.to_string()) {
            validation
                .warnings
                .push(format!("UNKNOWN_SPELL: {spell_id} is not in known/prepared lists"));
        }

        if spell.nivel > 0 {
            let casting_level = casting_level.unwrap_or(spell.nivel);
            if casting_level < spell.nivel {
                return Validation::reject(
                    ValidationCode::LevelTooLow,
                    format!("casting level {casting_level} below spell's base level {}", spell.nivel),
                );
            }
            let remaining = slots_remaining.get(&casting_level).copied().unwrap_or(0);
            if remaining == 0 {
                return Validation::reject(
                    ValidationCode::NoSlots,
                    format!("no remaining slots at nivel {casting_level}"),
                );
            }
        }

        if matches!(spell.objetivo, turnforge_domain::compendium::SpellTarget::SingleCreature
            | turnforge_domain::compendium::SpellTarget::MultipleCreatures)
            && target_id.is_none()
        {
            validation
                .warnings
                .push("no target supplied for a creature-targeting spell".to_string());
        }

        validation
    }

    fn validate_move(&self, actor_id: CombatantId, distance_feet: f32, state: &CombatState) -> Validation {
        let Some(actor) = self.combatant(state, actor_id) else {
            return Validation::reject(ValidationCode::Internal, "actor not in combat state");
        };
        for blocking in [
            ConditionKind::Paralyzed,
            ConditionKind::Petrified,
            ConditionKind::Stunned,
            ConditionKind::Unconscious,
            ConditionKind::Grappled,
            ConditionKind::Restrained,
        ] {
            if actor.conditions.contains(blocking) {
                return Validation::reject(
                    ValidationCode::ConditionBlocks,
                    format!("{blocking:?} prevents movement"),
                );
            }
        }
        let economy = state.economy.get(&actor_id);
        let remaining = economy.map(|e| e.movement_remaining as f32).unwrap_or(0.0);
        if distance_feet > remaining {
            return Validation::reject(
                ValidationCode::NoMovement,
                format!("{distance_feet}ft exceeds {remaining}ft remaining"),
            );
        }
        Validation::ok().with_extra(
            "movement_remaining_after",
            serde_json::json!(remaining - distance_feet),
        )
    }

    fn validate_skill(&self, actor_id: CombatantId, skill: Option<&str>, state: &CombatState) -> Validation {
        let Some(actor) = self.combatant(state, actor_id) else {
            return Validation::reject(ValidationCode::Internal, "actor not in combat state");
        };
        if !actor.can_act() {
            return Validation::reject(ValidationCode::CannotAct, "actor cannot act");
        }
        let Some(skill) = skill else {
            return Validation::reject(ValidationCode::InvalidSkill, "no skill specified");
        };
        if !vocabulary::is_known_skill(skill) {
            return Validation::reject(ValidationCode::InvalidSkill, format!("{skill} is not a recognized skill"));
        }

        let mut validation = Validation::ok();
        if skill == "percepcion" && actor.conditions.contains(ConditionKind::Blinded) {
            validation.warnings.push("VISION_DISADVANTAGE: blinded imposes disadvantage on sight-based perception".to_string());
            validation = validation.with_extra("mode", serde_json::json!("disadvantage"));
        } else if actor.conditions.contains(ConditionKind::Frightened) {
            validation.warnings.push("VISION_DISADVANTAGE: frightened imposes disadvantage while the source is in sight".to_string());
            validation = validation.with_extra("mode", serde_json::json!("disadvantage"));
        }
        validation
    }

    fn validate_generic_action(
        &self,
        actor_id: CombatantId,
        action_id: Option<vocabulary::GenericActionId>,
        state: &CombatState,
    ) -> Validation {
        use vocabulary::GenericActionId::*;
        let Some(actor) = self.combatant(state, actor_id) else {
            return Validation::reject(ValidationCode::Internal, "actor not in combat state");
        };
        if !actor.can_act() {
            return Validation::reject(ValidationCode::CannotAct, "actor cannot act");
        }
        let Some(action_id) = action_id else {
            return Validation::reject(ValidationCode::Internal, "no generic action specified");
        };
        let reason = match action_id {
            Dash => "doubles movement for the current turn",
            Dodge => "imposes disadvantage on attacks against the actor until its next turn",
            Disengage => "movement this turn does not provoke opportunity attacks",
            Help => "grants advantage to an ally's next check or attack",
            Hide => "attempts a Stealth check to become hidden",
            Search => "looks for something in the area",
            Ready => "prepares an action to trigger on a condition",
        };
        Validation::ok_with_warning(format!("{action_id:?}: {reason}"))
    }

    fn validate_use_item(&self, actor_id: CombatantId, item_id: Option<&str>, state: &CombatState) -> Validation {
        let Some(actor) = self.combatant(state, actor_id) else {
            return Validation::reject(ValidationCode::Internal, "actor not in combat state");
        };
        if !actor.can_act() {
            return Validation::reject(ValidationCode::CannotAct, "actor cannot act");
        }
        let Some(item_id) = item_id else {
            return Validation::reject(ValidationCode::Internal, "no item specified");
        };
        if self.compendium.item(item_id).is_none() {
            return Validation::reject(ValidationCode::Internal, format!("no such item: {item_id}"));
        }
        Validation::ok()
    }
}
