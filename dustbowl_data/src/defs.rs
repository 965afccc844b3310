use serde::{Deserialize, Serialize};

/// Stable identifier used for every cross-reference in the content tables.
pub type Key = String;

/// Top-level content file loaded by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContentDef {
    pub game: GameDef,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub weapons: Vec<WeaponDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub loadouts: Vec<LoadoutDef>,
    #[serde(default)]
    pub locations: Vec<LocationDef>,
    #[serde(default)]
    pub class_edges: Vec<ClassEdgeDef>,
}

/// Game-level metadata and graph entry points.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameDef {
    pub title: String,
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub intro: String,
    /// Location the navigator starts from (and resets to when a key goes missing).
    pub start: Key,
    /// Location every `PlayerDead` combat outcome routes to.
    pub game_over: Key,
}

/// A playable character class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub key: Key,
    pub name: String,
    pub max_hp: u32,
    /// Speed rating; 100 is average and feeds the flee formula.
    pub speed: i32,
}

/// Inclusive damage range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DamageRange {
    pub min: u32,
    pub max: u32,
}
impl DamageRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Fixed effects triggered by using a utility item in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtilityEffect {
    Heal { amount: u32 },
    Dodge,
    Buff,
    Debuff,
    HealAndBuff { amount: u32 },
}

/// A weapon or utility item that can sit in the player's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub key: Key,
    pub name: String,
    #[serde(default)]
    pub damage: DamageRange,
    pub accuracy: u32,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub utility: bool,
    /// Combat effect for utility items. Utilities without one are story-only and
    /// never offered as a combat action.
    #[serde(default)]
    pub effect: Option<UtilityEffect>,
}
impl WeaponDef {
    /// Returns true if this entry may be chosen during the attack step of combat.
    pub fn usable_in_combat(&self) -> bool {
        !self.utility || self.effect.is_some()
    }
}

/// A scripted opponent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub key: Key,
    pub name: String,
    pub max_hp: u32,
    pub damage: DamageRange,
    pub accuracy: u32,
    #[serde(default)]
    pub special: Option<String>,
}

/// Inventory slot categories offered during loadout selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadoutSlot {
    Primary,
    Secondary,
    Melee,
    Pda,
}
impl LoadoutSlot {
    pub fn label(self) -> &'static str {
        match self {
            LoadoutSlot::Primary => "primary",
            LoadoutSlot::Secondary => "secondary",
            LoadoutSlot::Melee => "melee",
            LoadoutSlot::Pda => "pda",
        }
    }
}

/// Weapon options for one slot of a class loadout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDef {
    pub slot: LoadoutSlot,
    pub choices: Vec<Key>,
}

/// The per-class equipment menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadoutDef {
    pub class: Key,
    /// Weapons equipped unconditionally before slot selection.
    #[serde(default)]
    pub granted: Vec<Key>,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
}

/// Kinds of pickups that can be left on a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Health,
    Ammo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDropDef {
    pub kind: ItemKind,
    pub amount: u32,
}

/// Combat gate on a location and where each outcome leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDef {
    pub enemy: Key,
    pub on_win: Key,
    pub on_flee: Key,
}

/// A labeled edge of the story graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDef {
    pub token: String,
    pub label: String,
    pub to: Key,
}

/// One node of the story graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDef {
    pub key: Key,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub encounter: Option<EncounterDef>,
    #[serde(default)]
    pub item: Option<ItemDropDef>,
    #[serde(default)]
    pub options: Vec<OptionDef>,
    #[serde(default)]
    pub ending: Option<String>,
}

/// An edge offered only to certain classes at a given location.
///
/// `{class}` in the label is replaced by the player's class name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEdgeDef {
    pub location: Key,
    pub classes: Vec<Key>,
    pub token: String,
    pub label: String,
    pub to: Key,
}
