//! Compendium adapter (spec §4.3): wraps a `CompendiumStore` port and
//! mints fresh `Instance`s. Never computes rule consequences - spell
//! upcasting, damage scaling, and similar belong to the executor, not
//! here (spec §4.3: "must not compute rule consequences").

use turnforge_domain::compendium::{ContentCategory, Instance, InstanceData};
use turnforge_domain::ids::InstanceId;
use turnforge_ports::CompendiumStore;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CompendiumAdapterError {
    #[error("unknown {category:?} key: {key}")]
    NotFound {
        category: ContentCategory,
        key: String,
    },
}

pub struct CompendiumAdapter<'a> {
    store: &'a dyn CompendiumStore,
}

impl<'a> CompendiumAdapter<'a> {
    pub fn new(store: &'a dyn CompendiumStore) -> Self {
        Self { store }
    }

    pub fn create_instance(
        &self,
        category: ContentCategory,
        key: &str,
    ) -> Result<Instance, CompendiumAdapterError> {
        let not_found = || CompendiumAdapterError::NotFound {
            category,
            key: key.to_string(),
        };

        let data = match category {
            ContentCategory::Weapon => {
                let entry = self.store.weapon(key).ok_or_else(not_found)?;
                InstanceData::Weapon {
                    damage: entry.damage,
                    damage_type: entry.damage_type,
                    properties: entry.properties,
                    magic_bonus: None,
                }
            }
            ContentCategory::Armor => {
                let entry = self.store.armor(key).ok_or_else(not_found)?;
                InstanceData::Armor {
                    base_ac: entry.base_ac,
                    max_dex_cap: entry.max_dex_cap,
                }
            }
            ContentCategory::Shield => {
                let entry = self.store.shield(key).ok_or_else(not_found)?;
                InstanceData::Shield {
                    ac_bonus: entry.ac_bonus,
                }
            }
            ContentCategory::Spell => {
                let entry = self.store.spell(key).ok_or_else(not_found)?;
                InstanceData::Spell {
                    nivel: entry.nivel,
                    objetivo: entry.objetivo,
                }
            }
            ContentCategory::Monster => {
                let entry = self.store.monster(key).ok_or_else(not_found)?;
                InstanceData::Monster {
                    hp_max: entry.hp_max,
                    hp_current: entry.hp_max,
                    ac: entry.ac,
                    abilities: entry.abilities,
                    actions: entry.actions,
                    traits_text: entry.text_only.iter().map(|t| t.text.clone()).collect(),
                    speed_ft: entry.speed_ft,
                    conditions: turnforge_domain::conditions::ConditionSet::new(),
                }
            }
            ContentCategory::Item => {
                let entry = self.store.item(key).ok_or_else(not_found)?;
                InstanceData::Item {
                    charges: entry.charges_max,
                }
            }
        };

        Ok(Instance {
            instance_id: InstanceId::new(),
            compendium_ref: Some(key.to_string()),
            kind: category,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnforge_domain::compendium::WeaponEntry;
    use turnforge_domain::damage::DamageType;
    use turnforge_ports::compendium_store::MockCompendiumStore;

    fn sample_weapon() -> WeaponEntry {
        WeaponEntry {
            key: "long_sword".to_string(),
            nombre: "Espada larga".to_string(),
            peso: 1.5,
            descripcion: "Una espada larga de acero.".to_string(),
            damage: "1d8".to_string(),
            damage_type: DamageType::Slashing,
            properties: vec!["versatile".to_string()],
            reach_ft: 5,
            range_ft: None,
            is_magical: false,
        }
    }

    #[test]
    fn creates_weapon_instance_with_fresh_id_and_no_magic_bonus() {
        let mut store = MockCompendiumStore::new();
        store
            .expect_weapon()
            .withf(|key| key == "long_sword")
            .returning(|_| Some(sample_weapon()));

        let adapter = CompendiumAdapter::new(&store);
        let instance = adapter
            .create_instance(ContentCategory::Weapon, "long_sword")
            .expect("weapon exists");

        assert_eq!(instance.compendium_ref, Some("long_sword".to_string()));
        match instance.data {
            InstanceData::Weapon { magic_bonus, .. } => assert_eq!(magic_bonus, None),
            _ => panic!("expected weapon instance"),
        }
    }

    #[test]
    fn two_instances_of_same_key_get_distinct_ids() {
        let mut store = MockCompendiumStore::new();
        store.expect_weapon().returning(|_| Some(sample_weapon()));
        let adapter = CompendiumAdapter::new(&store);
        let a = adapter.create_instance(ContentCategory::Weapon, "long_sword").unwrap();
        let b = adapter.create_instance(ContentCategory::Weapon, "long_sword").unwrap();
        assert_ne!(a.instance_id, b.instance_id);
    }

    #[test]
    fn unknown_key_is_not_found() {
        let mut store = MockCompendiumStore::new();
        store.expect_weapon().returning(|_| None);
        let adapter = CompendiumAdapter::new(&store);
        let err = adapter
            .create_instance(ContentCategory::Weapon, "nonexistent")
            .unwrap_err();
        assert_eq!(
            err,
            CompendiumAdapterError::NotFound {
                category: ContentCategory::Weapon,
                key: "nonexistent".to_string()
            }
        );
    }
}
