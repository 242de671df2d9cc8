//! Validator output (spec §4.5, §7): a legality verdict, never a mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Error-code vocabulary from §4.5/§7. `as_code` is the wire string used
/// in `extra.code` and `Rejected.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    NoTarget,
    TargetDead,
    WeaponNotFound,
    WeaponNotEquipped,
    SpellNotFound,
    NoSlots,
    LevelTooLow,
    CannotAct,
    NoMovement,
    ConditionBlocks,
    InvalidSkill,
    Internal,
}

impl ValidationCode {
    pub fn as_code(self) -> &'static str {
        match self {
            ValidationCode::NoTarget => "NO_TARGET",
            ValidationCode::TargetDead => "TARGET_DEAD",
            ValidationCode::WeaponNotFound => "WEAPON_NOT_FOUND",
            ValidationCode::WeaponNotEquipped => "WEAPON_NOT_EQUIPPED",
            ValidationCode::SpellNotFound => "SPELL_NOT_FOUND",
            ValidationCode::NoSlots => "NO_SLOTS",
            ValidationCode::LevelTooLow => "LEVEL_TOO_LOW",
            ValidationCode::CannotAct => "CANNOT_ACT",
            ValidationCode::NoMovement => "NO_MOVEMENT",
            ValidationCode::ConditionBlocks => "CONDITION_BLOCKS",
            ValidationCode::InvalidSkill => "INVALID_SKILL",
            ValidationCode::Internal => "INTERNAL",
        }
    }
}

/// Legality verdict over an actor/target/action-kind-specific input.
/// Never mutates state (spec §4.5 contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub reason: String,
    pub warnings: Vec<String>,
    pub extra: HashMap<String, Value>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
            warnings: Vec::new(),
            extra: HashMap::new(),
        }
    }

    pub fn ok_with_warning(warning: impl Into<String>) -> Self {
        let mut validation = Self::ok();
        validation.warnings.push(warning.into());
        validation
    }

    pub fn reject(code: ValidationCode, reason: impl Into<String>) -> Self {
        let mut extra = HashMap::new();
        extra.insert("code".to_string(), Value::String(code.as_code().to_string()));
        Self {
            valid: false,
            reason: format!("{}: {}", code.as_code(), reason.into()),
            warnings: Vec::new(),
            extra,
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.extra.get("code").and_then(Value::as_str)
    }
}
