//! Damage typing and resistance/vulnerability/immunity application
//! (SPEC_FULL §3 - grounded on the retrieved solo-5e-style
//! `adjust_damage_by_type` helper).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Bludgeoning,
    Piercing,
    Slashing,
    Fire,
    Cold,
    Lightning,
    Acid,
    Poison,
    Psychic,
    Radiant,
    Necrotic,
    Thunder,
    Force,
}

impl DamageType {
    pub fn parse(s: &str) -> Option<Self> {
        use DamageType::*;
        Some(match s.to_lowercase().as_str() {
            "bludgeoning" | "contundente" => Bludgeoning,
            "piercing" | "perforante" => Piercing,
            "slashing" | "cortante" => Slashing,
            "fire" | "fuego" => Fire,
            "cold" | "frio" => Cold,
            "lightning" | "rayo" => Lightning,
            "acid" | "acido" => Acid,
            "poison" | "veneno" => Poison,
            "psychic" | "psiquico" => Psychic,
            "radiant" | "radiante" => Radiant,
            "necrotic" | "necrotico" => Necrotic,
            "thunder" | "trueno" => Thunder,
            "force" | "fuerza" => Force,
            _ => return None,
        })
    }
}

/// Apply resistance (half, rounded down), vulnerability (double), and
/// immunity (zero) in that precedence order. Immunity wins outright;
/// resistance and vulnerability on the same type cancel per 5e rules.
pub fn adjust_damage(
    raw: i32,
    kind: DamageType,
    resistances: &HashSet<DamageType>,
    vulnerabilities: &HashSet<DamageType>,
    immunities: &HashSet<DamageType>,
) -> i32 {
    if immunities.contains(&kind) {
        return 0;
    }
    let resistant = resistances.contains(&kind);
    let vulnerable = vulnerabilities.contains(&kind);
    match (resistant, vulnerable) {
        (true, true) => raw,
        (true, false) => raw.div_euclid(2),
        (false, true) => raw * 2,
        (false, false) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistance_halves_rounded_down() {
        let mut resist = HashSet::new();
        resist.insert(DamageType::Fire);
        let adjusted = adjust_damage(7, DamageType::Fire, &resist, &HashSet::new(), &HashSet::new());
        assert_eq!(adjusted, 3);
    }

    #[test]
    fn vulnerability_doubles() {
        let mut vuln = HashSet::new();
        vuln.insert(DamageType::Cold);
        let adjusted = adjust_damage(5, DamageType::Cold, &HashSet::new(), &vuln, &HashSet::new());
        assert_eq!(adjusted, 10);
    }

    #[test]
    fn immunity_zeroes_even_with_vulnerability() {
        let mut vuln = HashSet::new();
        vuln.insert(DamageType::Poison);
        let mut immune = HashSet::new();
        immune.insert(DamageType::Poison);
        let adjusted = adjust_damage(9, DamageType::Poison, &HashSet::new(), &vuln, &immune);
        assert_eq!(adjusted, 0);
    }

    #[test]
    fn resistance_and_vulnerability_cancel() {
        let mut resist = HashSet::new();
        resist.insert(DamageType::Acid);
        let mut vuln = HashSet::new();
        vuln.insert(DamageType::Acid);
        let adjusted = adjust_damage(8, DamageType::Acid, &resist, &vuln, &HashSet::new());
        assert_eq!(adjusted, 8);
    }
}
