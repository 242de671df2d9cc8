//! XP award on victory (SPEC_FULL §3, supplementing spec §6's combat
//! summary "XP total" which the distilled spec never explains how to
//! compute). Grounded on the teacher's XP-threshold table idiom, here
//! applied to the compendium's per-monster `xp` field rather than a
//! level-up curve - awarding XP for level-ups is the character layer's
//! concern, out of scope per spec §1.

use turnforge_domain::combatant::Combatant;

/// Sums the `xp` compendium field over a set of defeated enemies. Callers
/// look the field up themselves (the combat manager only stores each
/// enemy's `compendium_ref`, not its full `MonsterEntry`) and pass the
/// resolved amounts in; this function just totals them so the summation
/// policy lives in one place.
pub fn total_xp(defeated_enemy_xp: impl IntoIterator<Item = i32>) -> i32 {
    defeated_enemy_xp.into_iter().sum()
}

/// Enemies eligible for an XP award: dead, not allies/neutrals/players.
pub fn defeated_enemies(combatants: &[Combatant]) -> Vec<&Combatant> {
    combatants.iter().filter(|c| c.is_enemy() && c.dead).collect()
}
