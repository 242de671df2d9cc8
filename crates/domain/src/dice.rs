//! Seeded dice engine: expression parsing, advantage/disadvantage,
//! critical/fumble flags, and the convenience rolls the rest of the
//! engine is built on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Faces D&D 5e actually uses. Anything else is an `InvalidDie`.
const VALID_FACES: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty dice expression")]
    Empty,
    #[error("invalid dice expression: {0}")]
    InvalidFormat(String),
    #[error("dice count must be at least 1")]
    InvalidDiceCount,
    #[error("die face {0} is not a standard polyhedral die")]
    InvalidDie(u32),
}

/// Roll mode. Only meaningful for a single d20; silently downgraded to
/// `Normal` (and recorded as such) for anything else per spec §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Normal,
    Advantage,
    Disadvantage,
}

/// A parsed dice expression like `2d6+3` or `1d20-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub count: u32,
    pub faces: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub fn new(count: u32, faces: u32, modifier: i32) -> Result<Self, DiceError> {
        if count == 0 {
            return Err(DiceError::InvalidDiceCount);
        }
        if !VALID_FACES.contains(&faces) {
            return Err(DiceError::InvalidDie(faces));
        }
        Ok(Self {
            count,
            faces,
            modifier,
        })
    }

    /// Parse `^(\d*)d(\d+)([+-]\d+)?$` per spec §4.1.
    pub fn parse(expr: &str) -> Result<Self, DiceError> {
        let input = expr.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceError::Empty);
        }

        let d_pos = input
            .find('d')
            .ok_or_else(|| DiceError::InvalidFormat(format!("missing 'd' in '{input}'")))?;

        let count_str = &input[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidFormat(format!("invalid count '{count_str}'")))?
        };

        let after_d = &input[d_pos + 1..];
        let (faces_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let faces_str = &after_d[..plus_pos];
            let modifier = after_d[plus_pos + 1..]
                .parse::<i32>()
                .map_err(|_| DiceError::InvalidFormat(format!("invalid modifier in '{input}'")))?;
            (faces_str, modifier)
        } else if let Some(minus_pos) = after_d.rfind('-') {
            if minus_pos == 0 {
                return Err(DiceError::InvalidFormat(format!(
                    "invalid die size in '{input}'"
                )));
            }
            let faces_str = &after_d[..minus_pos];
            let modifier = after_d[minus_pos + 1..]
                .parse::<i32>()
                .map_err(|_| DiceError::InvalidFormat(format!("invalid modifier in '{input}'")))?;
            (faces_str, -modifier)
        } else {
            (after_d, 0)
        };

        let faces: u32 = faces_str
            .parse()
            .map_err(|_| DiceError::InvalidFormat(format!("invalid die size in '{input}'")))?;

        Self::new(count, faces, modifier)
    }

    pub fn display(&self) -> String {
        match self.modifier.cmp(&0) {
            std::cmp::Ordering::Equal => format!("{}d{}", self.count, self.faces),
            std::cmp::Ordering::Greater => {
                format!("{}d{}+{}", self.count, self.faces, self.modifier)
            }
            std::cmp::Ordering::Less => format!("{}d{}{}", self.count, self.faces, self.modifier),
        }
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Outcome of a single roll. `critical`/`fumble` are flags only - they
/// never imply rule consequences (e.g. no fumble table) per spec §4.1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RollResult {
    pub dice: Vec<i32>,
    pub modifier: i32,
    pub total: i32,
    pub expression: String,
    pub mode: Mode,
    pub discarded: Vec<i32>,
    pub critical: bool,
    pub fumble: bool,
    pub is_d20: bool,
}

/// A seeded, reproducible dice source. Owned by the session per spec §5
/// ("RNG: owned by the session; a single logical instance per session").
pub struct Dice {
    rng: StdRng,
    seed: Option<u64>,
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}

impl Dice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Re-seed from the last known seed if any, otherwise from entropy.
    /// Spec leaves this case open; decision recorded in DESIGN.md.
    pub fn reset(&mut self) {
        match self.seed {
            Some(seed) => self.rng = StdRng::seed_from_u64(seed),
            None => self.rng = StdRng::from_entropy(),
        }
    }

    fn roll_die(&mut self, faces: u32) -> i32 {
        self.rng.gen_range(1..=faces as i32)
    }

    /// Roll a parsed expression under the given mode.
    pub fn roll_expr(&mut self, dice: DiceExpr, mode: Mode) -> RollResult {
        let is_d20 = dice.count == 1 && dice.faces == 20;
        let effective_mode = if is_d20 { mode } else { Mode::Normal };

        let (kept, discarded) = match effective_mode {
            Mode::Normal => {
                let rolls: Vec<i32> = (0..dice.count).map(|_| self.roll_die(dice.faces)).collect();
                (rolls, Vec::new())
            }
            Mode::Advantage | Mode::Disadvantage => {
                let a = self.roll_die(dice.faces);
                let b = self.roll_die(dice.faces);
                let (keep, drop) = if effective_mode == Mode::Advantage {
                    (a.max(b), a.min(b))
                } else {
                    (a.min(b), a.max(b))
                };
                (vec![keep], vec![drop])
            }
        };

        let dice_total: i32 = kept.iter().sum();
        let total = dice_total + dice.modifier;
        let single_kept = if kept.len() == 1 { kept.first().copied() } else { None };

        RollResult {
            dice: kept,
            modifier: dice.modifier,
            total,
            expression: dice.display(),
            mode: effective_mode,
            discarded,
            critical: is_d20 && single_kept == Some(20),
            fumble: is_d20 && single_kept == Some(1),
            is_d20,
        }
    }

    /// Roll a raw expression string under the given mode.
    pub fn roll(&mut self, expr: &str, mode: Mode) -> Result<RollResult, DiceError> {
        let dice = DiceExpr::parse(expr)?;
        Ok(self.roll_expr(dice, mode))
    }

    pub fn roll_attack(&mut self, bonus: i32, mode: Mode) -> RollResult {
        let dice = DiceExpr::new(1, 20, bonus).expect("1d20 is always valid");
        self.roll_expr(dice, mode)
    }

    /// Roll damage, doubling dice (not the static modifier) on a critical.
    pub fn roll_damage(&mut self, expr: &str, critical: bool) -> Result<RollResult, DiceError> {
        let mut dice = DiceExpr::parse(expr)?;
        if critical {
            dice.count *= 2;
        }
        Ok(self.roll_expr(dice, Mode::Normal))
    }

    pub fn roll_save(&mut self, bonus: i32, mode: Mode) -> RollResult {
        let dice = DiceExpr::new(1, 20, bonus).expect("1d20 is always valid");
        self.roll_expr(dice, mode)
    }

    pub fn roll_skill(&mut self, bonus: i32, mode: Mode) -> RollResult {
        let dice = DiceExpr::new(1, 20, bonus).expect("1d20 is always valid");
        self.roll_expr(dice, mode)
    }

    pub fn roll_initiative(&mut self, dex_mod: i32, extra: i32) -> RollResult {
        let dice = DiceExpr::new(1, 20, dex_mod + extra).expect("1d20 is always valid");
        self.roll_expr(dice, Mode::Normal)
    }

    pub fn roll_ability_array(&mut self, method: AbilityArrayMethod) -> Vec<i32> {
        match method {
            AbilityArrayMethod::FourD6DropLowest => (0..6)
                .map(|_| {
                    let mut rolls: Vec<i32> = (0..4).map(|_| self.roll_die(6)).collect();
                    rolls.sort_unstable();
                    rolls[1..].iter().sum()
                })
                .collect(),
            AbilityArrayMethod::ThreeD6 => (0..6)
                .map(|_| (0..3).map(|_| self.roll_die(6)).sum())
                .collect(),
            AbilityArrayMethod::StandardArray => vec![15, 14, 13, 12, 10, 8],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityArrayMethod {
    FourD6DropLowest,
    ThreeD6,
    StandardArray,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shorthand_and_modifiers() {
        assert_eq!(
            DiceExpr::parse("d20").unwrap(),
            DiceExpr::new(1, 20, 0).unwrap()
        );
        assert_eq!(
            DiceExpr::parse("2d6+3").unwrap(),
            DiceExpr::new(2, 6, 3).unwrap()
        );
        assert_eq!(
            DiceExpr::parse("1d8-1").unwrap(),
            DiceExpr::new(1, 8, -1).unwrap()
        );
    }

    #[test]
    fn rejects_non_standard_faces() {
        assert_eq!(DiceExpr::parse("1d7"), Err(DiceError::InvalidDie(7)));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(DiceExpr::parse(""), Err(DiceError::Empty));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Dice::from_seed(42);
        let mut b = Dice::from_seed(42);
        for _ in 0..10 {
            assert_eq!(
                a.roll_attack(5, Mode::Normal).total,
                b.roll_attack(5, Mode::Normal).total
            );
        }
    }

    #[test]
    fn advantage_keeps_higher_and_records_discard() {
        let mut dice = Dice::from_seed(7);
        let result = dice.roll_attack(0, Mode::Advantage);
        assert_eq!(result.dice.len(), 1);
        assert_eq!(result.discarded.len(), 1);
        assert!(result.dice[0] >= result.discarded[0]);
    }

    #[test]
    fn advantage_disadvantage_ignored_for_non_d20() {
        let mut dice = Dice::from_seed(1);
        let result = dice.roll("2d6", Mode::Advantage).unwrap();
        assert_eq!(result.mode, Mode::Normal);
        assert!(result.discarded.is_empty());
        assert_eq!(result.dice.len(), 2);
    }

    #[test]
    fn critical_doubles_damage_dice_not_modifier() {
        let mut dice = Dice::from_seed(3);
        let normal = dice.roll_damage("1d8+3", false).unwrap();
        let crit = dice.roll_damage("1d8+3", true).unwrap();
        assert_eq!(normal.dice.len(), 1);
        assert_eq!(crit.dice.len(), 2);
        assert_eq!(normal.modifier, 3);
        assert_eq!(crit.modifier, 3);
    }

    #[test]
    fn natural_20_is_critical_natural_1_is_fumble() {
        // Seed chosen by local search over d20 outcomes is avoided; instead
        // roll enough times to observe both flags across a fixed seed.
        let mut dice = Dice::from_seed(99);
        let mut saw_crit = false;
        let mut saw_fumble = false;
        for _ in 0..200 {
            let r = dice.roll_attack(0, Mode::Normal);
            if r.total == 20 {
                assert!(r.critical);
                saw_crit = true;
            }
            if r.total == 1 {
                assert!(r.fumble);
                saw_fumble = true;
            }
        }
        assert!(saw_crit && saw_fumble);
    }

    #[test]
    fn reset_without_seed_reseeds_from_entropy() {
        let mut dice = Dice::new();
        dice.reset();
        assert!(dice.get_seed().is_none());
    }

    #[test]
    fn reset_with_seed_replays_sequence() {
        let mut dice = Dice::from_seed(5);
        let first = dice.roll_attack(0, Mode::Normal).total;
        dice.reset();
        let replayed = dice.roll_attack(0, Mode::Normal).total;
        assert_eq!(first, replayed);
    }
}
