//! Combat state (spec §3, §4.6). Mutated only through the combat manager's
//! methods (spec §5: "No external code may hold a mutable alias during
//! `process`").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combatant::Combatant;
use crate::event::Event;
use crate::ids::CombatantId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    pub terrain_difficult: bool,
    pub cover: bool,
    pub light_level: LightLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightLevel {
    Bright,
    Dim,
    Dark,
}

impl Default for LightLevel {
    fn default() -> Self {
        LightLevel::Bright
    }
}

/// Per-turn action economy (spec §3, GLOSSARY "Action economy").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TurnEconomy {
    pub action: bool,
    pub bonus: bool,
    pub reaction: bool,
    pub movement_remaining: i32,
}

impl TurnEconomy {
    pub fn fresh(speed_ft: i32) -> Self {
        Self {
            action: true,
            bonus: true,
            reaction: true,
            movement_remaining: speed_ft,
        }
    }
}

/// Append-only event log, totally ordered by `(round, turn_index,
/// event_index)` per spec §5.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundHistory {
    events: Vec<Event>,
    next_event_index: u64,
}

impl RoundHistory {
    pub fn push(&mut self, event: Event) {
        self.next_event_index += 1;
        self.events.push(event);
    }

    pub fn reset_turn_counter(&mut self) {
        self.next_event_index = 0;
    }

    pub fn next_index(&self) -> u64 {
        self.next_event_index
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub active: bool,
    pub combatants: HashMap<CombatantId, Combatant>,
    pub initiative_order: Vec<CombatantId>,
    pub turn_index: usize,
    pub round: u32,
    pub economy: HashMap<CombatantId, TurnEconomy>,
    pub history: RoundHistory,
    pub environment: Environment,
}

impl CombatState {
    pub fn new(environment: Environment) -> Self {
        Self {
            active: false,
            combatants: HashMap::new(),
            initiative_order: Vec::new(),
            turn_index: 0,
            round: 0,
            economy: HashMap::new(),
            history: RoundHistory::default(),
            environment,
        }
    }

    /// §3 invariant: `turn_index ∈ [0, len(order))`.
    pub fn turn_index_in_bounds(&self) -> bool {
        !self.active || self.turn_index < self.initiative_order.len()
    }

    pub fn active_combatant_id(&self) -> Option<CombatantId> {
        if !self.active {
            return None;
        }
        self.initiative_order.get(self.turn_index).copied()
    }

    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.active_combatant_id()
            .and_then(|id| self.combatants.get(&id))
    }

    /// §3 invariant: exactly one combatant has `es_su_turno = true` when
    /// `active`.
    pub fn exactly_one_active_turn(&self) -> bool {
        if !self.active {
            return self.combatants.values().all(|c| !c.es_su_turno);
        }
        self.combatants.values().filter(|c| c.es_su_turno).count() == 1
    }

    pub fn living_enemy_ids(&self) -> Vec<CombatantId> {
        self.initiative_order
            .iter()
            .filter(|id| {
                self.combatants
                    .get(id)
                    .map(|c| c.is_enemy() && c.is_alive())
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_no_active_turn() {
        let state = CombatState::new(Environment::default());
        assert!(state.exactly_one_active_turn());
        assert!(state.turn_index_in_bounds());
        assert_eq!(state.active_combatant_id(), None);
    }

    #[test]
    fn round_history_tracks_event_index_and_resets_per_turn() {
        let mut history = RoundHistory::default();
        history.push(crate::event::Event::test_stub());
        assert_eq!(history.next_index(), 1);
        history.reset_turn_counter();
        assert_eq!(history.next_index(), 0);
        assert_eq!(history.events().len(), 1);
    }

    #[test]
    fn turn_economy_fresh_has_full_budget() {
        let economy = TurnEconomy::fresh(30);
        assert!(economy.action && economy.bonus && economy.reaction);
        assert_eq!(economy.movement_remaining, 30);
    }
}
