//! Player -- the mercenary that persists across every encounter of a run.
use dustbowl_data::{ClassDef, ItemKind, WeaponDef};
use log::info;
use serde::{Deserialize, Serialize};

use crate::health::{HealthState, LivingEntity};
use crate::view::{InventoryLine, View, ViewItem};

/// Weapon key whose presence in the loadout grants the flee bonus.
pub const INVIS_WATCH_KEY: &str = "invis_watch";

/// Pending damage modifier granted by a utility for the next attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatBuff {
    #[default]
    None,
    MiniCrit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ammo {
    pub primary: u32,
    pub secondary: u32,
    pub sapper: u32,
}
impl Default for Ammo {
    fn default() -> Self {
        Self {
            primary: 20,
            secondary: 36,
            sapper: 1,
        }
    }
}
impl Ammo {
    /// Restore primary and secondary ammo to their starting counts.
    pub fn resupply(&mut self) {
        let full = Ammo::default();
        self.primary = full.primary;
        self.secondary = full.secondary;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub class_key: String,
    pub class_name: String,
    pub speed: i32,
    pub health: HealthState,
    /// Equip order is preserved; combat menus list items in this order.
    pub inventory: Vec<WeaponDef>,
    pub ammo: Ammo,
    pub is_dodging: bool,
    pub combat_buff: CombatBuff,
    pub has_invis_watch: bool,
}
impl Default for Player {
    fn default() -> Player {
        Self {
            name: "New Merc".into(),
            class_key: String::new(),
            class_name: String::new(),
            speed: 100,
            health: HealthState::new_at_max(100),
            inventory: Vec::new(),
            ammo: Ammo::default(),
            is_dodging: false,
            combat_buff: CombatBuff::None,
            has_invis_watch: false,
        }
    }
}
impl LivingEntity for Player {
    fn name(&self) -> &str {
        &self.name
    }
    fn health(&self) -> &HealthState {
        &self.health
    }
    fn health_mut(&mut self) -> &mut HealthState {
        &mut self.health
    }
}
impl Player {
    /// Build a fresh player of the given class. The class name is appended to `base_name`.
    pub fn from_class(base_name: &str, class: &ClassDef) -> Player {
        Player {
            name: format!("{base_name} the {}", class.name),
            class_key: class.key.clone(),
            class_name: class.name.clone(),
            speed: class.speed,
            health: HealthState::new_at_max(class.max_hp),
            ..Player::default()
        }
    }

    /// Add a weapon to the end of the inventory.
    pub fn equip(&mut self, weapon: WeaponDef) {
        if weapon.key == INVIS_WATCH_KEY {
            self.has_invis_watch = true;
        }
        info!("{} equipped '{}'", self.name, weapon.key);
        self.inventory.push(weapon);
    }

    /// Inventory entries that may be selected during the attack step, in equip order.
    pub fn combat_items(&self) -> Vec<&WeaponDef> {
        self.inventory.iter().filter(|w| w.usable_in_combat()).collect()
    }

    /// Clear flags that must never carry from one encounter into the next.
    pub fn reset_combat_flags(&mut self) {
        self.is_dodging = false;
        self.combat_buff = CombatBuff::None;
    }

    /// Apply a pickup found on a location.
    pub fn find_item(&mut self, kind: ItemKind, amount: u32, view: &mut View) {
        match kind {
            ItemKind::Health => {
                let healed = self.heal(amount);
                info!("{} picked up a health pack (+{healed} hp)", self.name);
                view.push(ViewItem::ItemFound { kind, amount });
                view.push(ViewItem::CharacterHealed {
                    name: self.name.clone(),
                    amount: healed,
                    hp_after: self.current_hp(),
                    max_hp: self.max_hp(),
                });
            },
            ItemKind::Ammo => {
                self.ammo.resupply();
                info!("{} picked up an ammo crate", self.name);
                view.push(ViewItem::ItemFound { kind, amount });
            },
        }
    }

    /// Push the status summary shown for the `stats` token and the combat inspect action.
    pub fn show_stats(&self, view: &mut View) {
        view.push(ViewItem::PlayerStats {
            class_name: self.class_name.clone(),
            hp: self.current_hp(),
            max_hp: self.max_hp(),
            speed: self.speed,
        });
    }

    pub fn show_inventory(&self, view: &mut View) {
        view.push(ViewItem::Inventory(
            self.inventory.iter().map(InventoryLine::from_weapon).collect(),
        ));
    }
}
