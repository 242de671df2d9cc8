//! Narration adapter (spec §4.7 step 5, component #9): structured events
//! -> optional prose via an injected narrator, with a deterministic
//! fallback that is always available (spec §9: "must function with both
//! absent").

use std::time::{Duration, Instant};

use turnforge_domain::damage::DamageType;
use turnforge_domain::event::{Event, EventKind};
use turnforge_domain::scene::SceneContext;
use turnforge_ports::NarratorPort;

/// Wraps a `NarratorPort` with the §5 wall-clock deadline (default 30s):
/// best-effort, degrades to the deterministic fallback on timeout or
/// error without ever failing the turn.
pub struct DeadlineNarrator<'a> {
    inner: Option<&'a dyn NarratorPort>,
    deadline: Duration,
}

impl<'a> DeadlineNarrator<'a> {
    pub fn new(inner: Option<&'a dyn NarratorPort>) -> Self {
        Self {
            inner,
            deadline: Duration::from_secs(30),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the narration string and any warning produced (e.g.
    /// `LLM_FAILURE` on error or deadline overrun).
    pub fn narrate(&self, events: &[Event], context: &SceneContext) -> (String, Option<String>) {
        let Some(narrator) = self.inner else {
            return (deterministic_fallback(events), None);
        };

        let start = Instant::now();
        match narrator.narrate(events, context) {
            Ok(text) if start.elapsed() <= self.deadline => (text, None),
            Ok(_) => (
                deterministic_fallback(events),
                Some("LLM_FAILURE: narrator exceeded its deadline".to_string()),
            ),
            Err(err) => (
                deterministic_fallback(events),
                Some(format!("LLM_FAILURE: {err}")),
            ),
        }
    }
}

/// Builds Spanish prose directly from event data, with no narrator
/// involved. Order follows §5's documented emission order (roll -> hit or
/// miss -> damage -> condition -> combatant_down).
pub fn deterministic_fallback(events: &[Event]) -> String {
    if events.is_empty() {
        return "No ocurre nada digno de mención.".to_string();
    }
    events.iter().map(describe_event).collect::<Vec<_>>().join(" ")
}

fn describe_event(event: &Event) -> String {
    let p = &event.payload;
    match event.kind {
        EventKind::AttackRolled => {
            let total = p.get("total").and_then(|v| v.as_i64()).unwrap_or_default();
            let hit = p.get("hit").and_then(|v| v.as_bool()).unwrap_or(false);
            let critical = p.get("critical").and_then(|v| v.as_bool()).unwrap_or(false);
            match (hit, critical) {
                (true, true) => format!("¡Golpe crítico! Tirada de ataque: {total}."),
                (true, false) => format!("Impacto con una tirada de {total}."),
                (false, _) => format!("Fallo con una tirada de {total}."),
            }
        }
        EventKind::Miss => "El ataque falla por completo.".to_string(),
        EventKind::DamageDealt => {
            let amount = p.get("amount").and_then(|v| v.as_i64()).unwrap_or_default();
            let damage_type = p
                .get("damage_type")
                .and_then(|v| serde_json::from_value::<DamageType>(v.clone()).ok())
                .map(describe_damage_type)
                .unwrap_or_default();
            format!("{amount} puntos de daño {damage_type}.")
        }
        EventKind::SpellCast => {
            let spell_id = p.get("spell_id").and_then(|v| v.as_str()).unwrap_or("un hechizo");
            format!("Se lanza {spell_id}.")
        }
        EventKind::SlotConsumed => {
            let level = p.get("level").and_then(|v| v.as_u64()).unwrap_or_default();
            format!("Se consume un espacio de nivel {level}.")
        }
        EventKind::MoveResolved => {
            let distance = p.get("distance_feet").and_then(|v| v.as_f64()).unwrap_or_default();
            format!("El combatiente se mueve {distance} pies.")
        }
        EventKind::SkillChecked => {
            let total = p.get("total").and_then(|v| v.as_i64()).unwrap_or_default();
            let skill = p.get("skill").and_then(|v| v.as_str()).unwrap_or("la prueba");
            format!("Tirada de {skill}: {total}.")
        }
        EventKind::GenericActionTaken => {
            let action = p.get("action_id").and_then(|v| v.as_str()).unwrap_or("una acción");
            format!("El combatiente realiza: {action}.")
        }
        EventKind::ConditionApplied => {
            let condition = p.get("condition").and_then(|v| v.as_str()).unwrap_or("una condición");
            format!("Se aplica la condición {condition}.")
        }
        EventKind::ConditionRemoved => {
            let condition = p.get("condition").and_then(|v| v.as_str()).unwrap_or("una condición");
            format!("Se elimina la condición {condition}.")
        }
        EventKind::CombatantDown => "¡El combatiente cae!".to_string(),
        EventKind::CombatEnded => {
            let reason = p.get("reason").and_then(|v| v.as_str()).unwrap_or("el combate termina");
            format!("El combate termina: {reason}.")
        }
    }
}

fn describe_damage_type(kind: DamageType) -> &'static str {
    use DamageType::*;
    match kind {
        Bludgeoning => "contundente",
        Piercing => "perforante",
        Slashing => "cortante",
        Fire => "de fuego",
        Cold => "de frío",
        Lightning => "de rayo",
        Acid => "de ácido",
        Poison => "de veneno",
        Psychic => "psíquico",
        Radiant => "radiante",
        Necrotic => "necrótico",
        Thunder => "de trueno",
        Force => "de fuerza",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use turnforge_domain::ids::CombatantId;
    use turnforge_ports::narrator::MockNarratorPort;

    fn sample_events() -> Vec<Event> {
        let timestamp = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        vec![
            Event::attack_rolled(
                CombatantId::new(),
                CombatantId::new(),
                18,
                13,
                true,
                false,
                false,
                None,
                timestamp,
                1,
                0,
                0,
            ),
            Event::damage_dealt(CombatantId::new(), CombatantId::new(), 7, DamageType::Slashing, timestamp, 1, 0, 1),
        ]
    }

    #[test]
    fn fallback_mentions_hit_and_damage_when_no_narrator() {
        let narrator = DeadlineNarrator::new(None);
        let (text, warning) = narrator.narrate(&sample_events(), &sample_scene());
        assert!(text.contains("Impacto"));
        assert!(text.contains("7 puntos de daño cortante"));
        assert!(warning.is_none());
    }

    #[test]
    fn narrator_error_degrades_to_fallback_with_warning() {
        let mut mock = MockNarratorPort::new();
        mock.expect_narrate().returning(|_, _| Err("network down".to_string()));
        let narrator = DeadlineNarrator::new(Some(&mock));
        let (text, warning) = narrator.narrate(&sample_events(), &sample_scene());
        assert!(text.contains("Impacto"));
        assert!(warning.unwrap().contains("LLM_FAILURE"));
    }

    #[test]
    fn narrator_success_is_used_verbatim() {
        let mut mock = MockNarratorPort::new();
        mock.expect_narrate().returning(|_, _| Ok("Thorin golpea al orco.".to_string()));
        let narrator = DeadlineNarrator::new(Some(&mock));
        let (text, warning) = narrator.narrate(&sample_events(), &sample_scene());
        assert_eq!(text, "Thorin golpea al orco.");
        assert!(warning.is_none());
    }

    fn sample_scene() -> SceneContext {
        use std::collections::HashMap;
        SceneContext {
            actor: CombatantId::new(),
            primary_weapon: None,
            secondary_weapon: None,
            available_weapons: vec![],
            known_spells: vec![],
            available_slots: HashMap::new(),
            living_enemies: vec![],
            allies: vec![],
            movement_remaining: 0.0,
            action_available: true,
            bonus_available: true,
            attack_bonus: 0,
            damage_bonus: 0,
            spell_attack_bonus: None,
            spell_save_dc: None,
            skill_bonuses: HashMap::new(),
        }
    }
}
