//! Read-only content lookup (spec §4.3, §6). Implementations never
//! mutate; the engine's compendium adapter wraps this to mint instances.

use turnforge_domain::compendium::{
    ArmorEntry, ItemEntry, MonsterEntry, ShieldEntry, SpellEntry, WeaponEntry,
};

/// One lookup method per category named in spec §6. Returns owned clones
/// rather than references so the trait stays object-safe and mockable.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CompendiumStore: Send + Sync {
    fn weapon(&self, key: &str) -> Option<WeaponEntry>;
    fn armor(&self, key: &str) -> Option<ArmorEntry>;
    fn shield(&self, key: &str) -> Option<ShieldEntry>;
    fn spell(&self, key: &str) -> Option<SpellEntry>;
    fn monster(&self, key: &str) -> Option<MonsterEntry>;
    fn item(&self, key: &str) -> Option<ItemEntry>;

    /// `(key, nombre)` for every known spell, for the normalizer's literal
    /// spell-name match (spec §4.4 step 2(b): scene-local list first, then
    /// this full compendium scan).
    fn all_spell_names(&self) -> Vec<(String, String)>;
}
