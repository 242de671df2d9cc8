//! Normalizer (spec §4.4): free player text + `SceneContext` ->
//! `CanonicalAction`, pattern-first with an optional LLM fallback.
//! Stateless between calls - all state lives in the `SceneContext` the
//! caller passes in.

use std::time::{Duration, Instant};

use turnforge_domain::canonical_action::{
    ActionData, ActionSource, AttackSubtype, CanonicalAction, MissingField, NormalizerPrompt,
};
use turnforge_domain::dice::Mode;
use turnforge_domain::ids::CombatantId;
use turnforge_domain::scene::SceneContext;
use turnforge_domain::vocabulary::{self, GenericActionId, VerbIntent};
use turnforge_ports::{CompendiumStore, NormalizerLlmPort};

/// Distance conversions named per SPEC_FULL §2.5, since spec §4.4 step 3
/// leaves the exact constant names open.
const M_TO_FT: f32 = 3.28;
const SQUARE_TO_FT: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("empty input text")]
    InvalidInput,
}

pub struct Normalizer<'a> {
    compendium: &'a dyn CompendiumStore,
    llm: Option<&'a dyn NormalizerLlmPort>,
    llm_deadline: Duration,
}

impl<'a> Normalizer<'a> {
    pub fn new(compendium: &'a dyn CompendiumStore) -> Self {
        Self {
            compendium,
            llm: None,
            llm_deadline: Duration::from_secs(30),
        }
    }

    /// §5: narrator-independent normalizer callback, best-effort with a
    /// wall-clock deadline (default 30s).
    pub fn with_llm_fallback(mut self, llm: &'a dyn NormalizerLlmPort, deadline: Duration) -> Self {
        self.llm = Some(llm);
        self.llm_deadline = deadline;
        self
    }

    pub fn normalize(
        &self,
        text: &str,
        scene: &SceneContext,
    ) -> Result<CanonicalAction, NormalizeError> {
        let normalized = preprocess(text);
        if normalized.is_empty() {
            return Err(NormalizeError::InvalidInput);
        }

        let mut action = self.detect_intent(&normalized, text, scene);
        self.extract_entities(&mut action, &normalized, scene);
        self.resolve_ambiguity(&mut action, scene);
        action.missing_fields = compute_missing_fields(&action.data);

        if self.needs_llm(&action) {
            self.apply_llm_fallback(&mut action, scene);
        }

        self.canonicalize(&mut action);
        tracing::debug!(
            kind = action.data.kind_name(),
            confidence = action.confidence,
            source = ?action.source,
            "normalized action"
        );
        Ok(action)
    }

    /// Step 2: intent detection, checked in spec priority order, first
    /// hit wins.
    fn detect_intent(&self, normalized: &str, original_text: &str, scene: &SceneContext) -> CanonicalAction {
        let actor = scene.actor;

        // (a) generic action phrase
        if let Some((_, action_id)) = vocabulary::GENERIC_ACTION_PHRASES
            .iter()
            .find(|(phrase, _)| normalized.contains(phrase))
        {
            return CanonicalAction::new(
                ActionData::GenericAction {
                    actor_id: actor,
                    action_id: Some(*action_id),
                },
                original_text,
                0.7,
            );
        }

        // (b) literal spell name match: scene-local known spells first,
        // then the full compendium.
        if let Some(spell_id) = self.find_spell_literal(normalized, scene) {
            return CanonicalAction::new(
                ActionData::Spell {
                    caster_id: actor,
                    target_id: None,
                    spell_id: Some(spell_id),
                    casting_level: None,
                },
                original_text,
                0.6,
            );
        }

        // (c) literal skill-name match from the closed set
        if let Some(skill) = vocabulary::SKILL_NAMES.iter().find(|s| normalized.contains(*s)) {
            return CanonicalAction::new(
                ActionData::Skill {
                    actor_id: actor,
                    skill: Some((*skill).to_string()),
                    target_id: None,
                },
                original_text,
                0.65,
            );
        }

        // (d) verb lookup in the shared vocabulary map. Overrides are
        // multi-word phrases matched by substring ahead of single-token
        // verbs, so "tomo posicion" resolves to Move rather than the bare
        // "tomo" -> UseItem entry.
        if let Some((_, intent)) = vocabulary::VERB_OVERRIDES
            .iter()
            .find(|(phrase, _)| normalized.contains(phrase))
        {
            return seed_action_for_intent(*intent, actor, original_text);
        }
        if let Some(intent) = normalized.split_whitespace().find_map(|word| {
            vocabulary::VERB_INTENTS
                .iter()
                .find(|(verb, _)| *verb == word)
                .map(|(_, intent)| *intent)
        }) {
            return seed_action_for_intent(intent, actor, original_text);
        }

        // (e) potion/item phrase
        if is_item_phrase(normalized) {
            return CanonicalAction::new(
                ActionData::UseItem {
                    actor_id: actor,
                    item_id: None,
                },
                original_text,
                0.5,
            );
        }

        // (f) otherwise Unknown, confidence 0
        CanonicalAction::new(ActionData::Unknown { actor_id: actor }, original_text, 0.0)
    }

    /// Step 3: kind-specific entity extraction.
    fn extract_entities(&self, action: &mut CanonicalAction, normalized: &str, scene: &SceneContext) {
        let mut skill_hint_used = false;
        match &mut action.data {
            ActionData::Attack {
                target_id,
                weapon_id,
                subtype,
                ..
            } => {
                if target_id.is_none() {
                    *target_id = find_target(normalized, scene);
                }
                if vocabulary::UNARMED_KEYWORDS.iter().any(|k| normalized.contains(k)) {
                    *weapon_id = Some("unarmed".to_string());
                    *subtype = AttackSubtype::Unarmed;
                } else if weapon_id.is_none() {
                    *weapon_id = self.find_weapon(normalized, scene);
                }
            }
            ActionData::Spell {
                target_id,
                spell_id,
                casting_level,
                ..
            } => {
                if spell_id.is_none() {
                    *spell_id = self.find_spell_literal(normalized, scene);
                }
                if target_id.is_none() {
                    *target_id = find_target(normalized, scene);
                }
                if casting_level.is_none() {
                    *casting_level = extract_casting_level(normalized);
                }
            }
            ActionData::Move { distance_feet, .. } => {
                if let Some(distance) = extract_distance_feet(normalized) {
                    *distance_feet = distance;
                }
            }
            ActionData::Skill { skill, target_id, .. } => {
                if skill.is_none() {
                    if let Some(named) = vocabulary::SKILL_NAMES.iter().find(|s| normalized.contains(*s)) {
                        *skill = Some((*named).to_string());
                    } else if let Some(hint) =
                        normalized.split_whitespace().find_map(vocabulary::lookup_skill_hint)
                    {
                        *skill = Some(hint.to_string());
                        skill_hint_used = true;
                    }
                }
                if target_id.is_none() {
                    *target_id = find_target(normalized, scene);
                }
            }
            ActionData::UseItem { .. } | ActionData::GenericAction { .. } | ActionData::Unknown { .. } => {}
        }
        if skill_hint_used {
            action.confidence = action.confidence.max(0.85);
        }
    }

    /// Step 4: ambiguity resolution without the LLM.
    fn resolve_ambiguity(&self, action: &mut CanonicalAction, scene: &SceneContext) {
        match &mut action.data {
            ActionData::Attack {
                target_id, weapon_id, ..
            } => {
                if target_id.is_none() {
                    match scene.living_enemies.as_slice() {
                        [only] => {
                            *target_id = Some(only.id);
                            action.warnings.push("target inferred".to_string());
                            action.confidence = (action.confidence + 0.1).min(1.0);
                        }
                        [] => {}
                        many => {
                            let candidates: Vec<String> =
                                many.iter().map(|o| o.display_name.clone()).collect();
                            action
                                .warnings
                                .push(format!("ambiguous target, candidates: {}", candidates.join(", ")));
                        }
                    }
                }
                if weapon_id.is_none() {
                    if let Some(primary) = &scene.primary_weapon {
                        action.warnings.push(format!("weapon inferred: {primary}"));
                        *weapon_id = Some(primary.clone());
                    } else if let Some(secondary) = &scene.secondary_weapon {
                        action.warnings.push(format!("weapon inferred: {secondary}"));
                        *weapon_id = Some(secondary.clone());
                    }
                }
            }
            ActionData::Spell {
                spell_id,
                casting_level,
                ..
            } => {
                if casting_level.is_none() {
                    if let Some(id) = spell_id {
                        if let Some(spell) = self.compendium.spell(id) {
                            *casting_level = Some(spell.nivel);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Step 5 gate: not yet complete (missing a critical field or
    /// confidence below 0.7) and a fallback callback was injected.
    fn needs_llm(&self, action: &CanonicalAction) -> bool {
        self.llm.is_some() && (!action.missing_fields.is_empty() || action.confidence < 0.7)
    }

    fn apply_llm_fallback(&self, action: &mut CanonicalAction, scene: &SceneContext) {
        let Some(llm) = self.llm else { return };
        let prompt = NormalizerPrompt {
            original_text: action.original_text.clone(),
            detected_kind: action.data.kind_name(),
            partial: action.data.clone(),
            missing_fields: action.missing_fields.clone(),
            scene_summary: summarize_scene(scene),
        };
        let start = Instant::now();
        match llm.fill(prompt) {
            Ok(value) => {
                if start.elapsed() > self.llm_deadline {
                    action.add_warning("LLM_FAILURE: normalizer fallback exceeded its deadline");
                    return;
                }
                apply_llm_fields(action, &value);
                action.source = ActionSource::Llm;
                action.bump_confidence(0.15);
                action.confidence = action.confidence.min(0.9);
                action.missing_fields = compute_missing_fields(&action.data);
            }
            Err(err) => {
                tracing::warn!(error = %err, "normalizer LLM fallback failed");
                action.add_warning(format!("LLM_FAILURE: {err}"));
            }
        }
    }

    /// Step 6: fill kind-specific defaults and compute `needs_clarification`.
    fn canonicalize(&self, action: &mut CanonicalAction) {
        if let ActionData::Spell {
            spell_id: Some(id),
            casting_level,
            ..
        } = &mut action.data
        {
            if casting_level.is_none() {
                if let Some(spell) = self.compendium.spell(id) {
                    *casting_level = Some(spell.nivel);
                }
            }
        }
        action.missing_fields = compute_missing_fields(&action.data);
        action.recompute_needs_clarification();
    }

    fn find_spell_literal(&self, normalized: &str, scene: &SceneContext) -> Option<String> {
        for spell_id in &scene.known_spells {
            if let Some(spell) = self.compendium.spell(spell_id) {
                if normalized.contains(&preprocess(&spell.nombre)) {
                    return Some(spell_id.clone());
                }
            }
        }
        self.compendium
            .all_spell_names()
            .into_iter()
            .find(|(_, nombre)| normalized.contains(&preprocess(nombre)))
            .map(|(key, _)| key)
    }

    fn find_weapon(&self, normalized: &str, scene: &SceneContext) -> Option<String> {
        scene
            .available_weapons
            .iter()
            .find(|id| {
                self.compendium
                    .weapon(id)
                    .map(|w| normalized.contains(&preprocess(&w.nombre)))
                    .unwrap_or(false)
            })
            .cloned()
    }
}

/// Step 1 preprocessing: lowercase, strip punctuation except hyphens
/// (accented letters are already Unicode-alphanumeric so they survive
/// untouched), collapse whitespace.
pub fn preprocess(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() || c == '-' || c.is_whitespace() {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn seed_action_for_intent(intent: VerbIntent, actor: CombatantId, original_text: &str) -> CanonicalAction {
    match intent {
        VerbIntent::Attack => CanonicalAction::new(
            ActionData::Attack {
                attacker_id: actor,
                target_id: None,
                weapon_id: None,
                subtype: AttackSubtype::Melee,
                mode: Mode::Normal,
            },
            original_text,
            0.6,
        ),
        VerbIntent::Spell => CanonicalAction::new(
            ActionData::Spell {
                caster_id: actor,
                target_id: None,
                spell_id: None,
                casting_level: None,
            },
            original_text,
            0.5,
        ),
        VerbIntent::Move => CanonicalAction::new(
            ActionData::Move {
                actor_id: actor,
                distance_feet: 0.0,
                destination: None,
            },
            original_text,
            0.6,
        ),
        VerbIntent::Skill => CanonicalAction::new(
            ActionData::Skill {
                actor_id: actor,
                skill: None,
                target_id: None,
            },
            original_text,
            0.55,
        ),
        VerbIntent::UseItem => CanonicalAction::new(
            ActionData::UseItem {
                actor_id: actor,
                item_id: None,
            },
            original_text,
            0.5,
        ),
    }
}

fn find_target(normalized: &str, scene: &SceneContext) -> Option<CombatantId> {
    scene
        .living_enemies
        .iter()
        .chain(scene.allies.iter())
        .find(|opt| normalized.contains(&preprocess(&opt.display_name)))
        .map(|opt| opt.id)
}

fn extract_casting_level(normalized: &str) -> Option<u8> {
    let idx = normalized.find("nivel")?;
    let rest = normalized[idx + "nivel".len()..].trim_start();
    rest.split_whitespace().next()?.parse().ok()
}

fn extract_distance_feet(normalized: &str) -> Option<f32> {
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    for (i, tok) in tokens.iter().enumerate() {
        if let Ok(n) = tok.parse::<f32>() {
            match tokens.get(i + 1).copied() {
                Some("pies" | "pie" | "ft") => return Some(n),
                Some("m" | "metro" | "metros") => return Some(n * M_TO_FT),
                Some("casilla" | "casillas" | "square" | "squares") => return Some(n * SQUARE_TO_FT),
                _ => {}
            }
        }
    }
    None
}

fn is_item_phrase(normalized: &str) -> bool {
    normalized.contains("pocion") || normalized.contains("pergamino")
}

fn compute_missing_fields(data: &ActionData) -> Vec<MissingField> {
    match data {
        ActionData::Attack {
            target_id, weapon_id, ..
        } => {
            let mut missing = Vec::new();
            if target_id.is_none() {
                missing.push(MissingField::TargetId);
            }
            if weapon_id.is_none() {
                missing.push(MissingField::WeaponId);
            }
            missing
        }
        ActionData::Spell { spell_id, .. } => optional_missing(spell_id, MissingField::SpellId),
        ActionData::Move { .. } => Vec::new(),
        ActionData::Skill { skill, .. } => optional_missing(skill, MissingField::Skill),
        ActionData::GenericAction { action_id, .. } => optional_missing(action_id, MissingField::ActionId),
        ActionData::UseItem { item_id, .. } => optional_missing(item_id, MissingField::ItemId),
        ActionData::Unknown { .. } => Vec::new(),
    }
}

fn optional_missing<T>(field: &Option<T>, missing: MissingField) -> Vec<MissingField> {
    if field.is_none() {
        vec![missing]
    } else {
        Vec::new()
    }
}

fn summarize_scene(scene: &SceneContext) -> String {
    format!(
        "enemigos vivos: {}; aliados: {}; movimiento restante: {}",
        scene.living_enemies.len(),
        scene.allies.len(),
        scene.movement_remaining
    )
}

fn parse_generic_action_id(raw: &str) -> Option<GenericActionId> {
    match raw {
        "dash" => Some(GenericActionId::Dash),
        "dodge" => Some(GenericActionId::Dodge),
        "disengage" => Some(GenericActionId::Disengage),
        "help" => Some(GenericActionId::Help),
        "hide" => Some(GenericActionId::Hide),
        "search" => Some(GenericActionId::Search),
        "ready" => Some(GenericActionId::Ready),
        _ => None,
    }
}

fn apply_llm_fields(action: &mut CanonicalAction, value: &serde_json::Value) {
    let Some(obj) = value.as_object() else { return };
    let str_field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let id_field = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<uuid::Uuid>().ok())
            .map(CombatantId::from)
    };

    match &mut action.data {
        ActionData::Attack {
            target_id, weapon_id, ..
        } => {
            if target_id.is_none() {
                *target_id = id_field("target_id");
            }
            if weapon_id.is_none() {
                *weapon_id = str_field("weapon_id");
            }
        }
        ActionData::Spell {
            spell_id,
            casting_level,
            target_id,
            ..
        } => {
            if spell_id.is_none() {
                *spell_id = str_field("spell_id");
            }
            if casting_level.is_none() {
                *casting_level = obj.get("casting_level").and_then(|v| v.as_u64()).map(|n| n as u8);
            }
            if target_id.is_none() {
                *target_id = id_field("target_id");
            }
        }
        ActionData::Skill { skill, target_id, .. } => {
            if skill.is_none() {
                *skill = str_field("skill");
            }
            if target_id.is_none() {
                *target_id = id_field("target_id");
            }
        }
        ActionData::GenericAction { action_id, .. } => {
            if action_id.is_none() {
                *action_id = str_field("action_id").as_deref().and_then(parse_generic_action_id);
            }
        }
        ActionData::UseItem { item_id, .. } => {
            if item_id.is_none() {
                *item_id = str_field("item_id");
            }
        }
        ActionData::Move {
            distance_feet,
            destination,
            ..
        } => {
            if let Some(d) = obj.get("distance_feet").and_then(|v| v.as_f64()) {
                *distance_feet = d as f32;
            }
            if destination.is_none() {
                *destination = str_field("destination");
            }
        }
        ActionData::Unknown { .. } => {}
    }
}
