//! Condition set and turn-boundary bookkeeping (spec §4.6, supplemented
//! per SPEC_FULL §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Blinded,
    Charmed,
    Deafened,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
    /// Not a 5e status condition proper - the `GenericAction::Dodge`
    /// marker (SPEC_FULL §3: "Dodge flags the combatant until the start
    /// of its next turn"). Modeled here so it rides the same expiry
    /// bookkeeping as everything else rather than a bespoke bool.
    Dodging,
}

impl ConditionKind {
    /// §4.5 `can_act` predicate: any of these blocks action economy.
    pub fn blocks_action(self) -> bool {
        matches!(
            self,
            ConditionKind::Paralyzed
                | ConditionKind::Petrified
                | ConditionKind::Stunned
                | ConditionKind::Incapacitated
        )
    }

    /// §4.5 Move rejection set.
    pub fn blocks_movement(self) -> bool {
        matches!(
            self,
            ConditionKind::Paralyzed
                | ConditionKind::Petrified
                | ConditionKind::Stunned
                | ConditionKind::Unconscious
                | ConditionKind::Grappled
                | ConditionKind::Restrained
        )
    }
}

/// When a condition clears itself, if ever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnBoundary {
    StartOfBearerNextTurn,
    EndOfBearerNextTurn,
    /// Persists until explicitly removed (e.g. unconscious, grappled).
    Indefinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionState {
    pub expires: TurnBoundary,
}

/// Set-valued condition bag with turn-boundary expiry bookkeeping.
/// Applying an existing condition is a no-op unless the new application
/// outlives the current one, in which case `expires` is refreshed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionSet(HashMap<ConditionKind, ConditionState>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: ConditionKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn apply(&mut self, kind: ConditionKind, expires: TurnBoundary) {
        match self.0.get_mut(&kind) {
            Some(existing) if outlives(existing.expires, expires) => {}
            _ => {
                self.0.insert(kind, ConditionState { expires });
            }
        }
    }

    pub fn remove(&mut self, kind: ConditionKind) -> bool {
        self.0.remove(&kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConditionKind, &ConditionState)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn any_blocks_action(&self) -> bool {
        self.0.keys().any(|k| k.blocks_action())
    }

    pub fn any_blocks_movement(&self) -> bool {
        self.0.keys().any(|k| k.blocks_movement())
    }

    /// Remove every condition whose expiry matches `boundary`, returning
    /// the removed kinds.
    pub fn expire_at(&mut self, boundary: TurnBoundary) -> Vec<ConditionKind> {
        let expired: Vec<ConditionKind> = self
            .0
            .iter()
            .filter(|(_, state)| state.expires == boundary)
            .map(|(kind, _)| *kind)
            .collect();
        for kind in &expired {
            self.0.remove(kind);
        }
        expired
    }
}

/// `true` if `existing` outlives (or ties) `incoming`, so a re-application
/// should not shorten it.
fn outlives(existing: TurnBoundary, incoming: TurnBoundary) -> bool {
    use TurnBoundary::*;
    matches!(
        (existing, incoming),
        (Indefinite, _) | (EndOfBearerNextTurn, StartOfBearerNextTurn)
    ) || existing == incoming
}
