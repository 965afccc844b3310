//! Enemy -- runtime state for the opponent of a single encounter.
use dustbowl_data::{DamageRange, EnemyDef};
use serde::{Deserialize, Serialize};

use crate::health::{HealthState, LivingEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub key: String,
    pub name: String,
    pub health: HealthState,
    pub damage: DamageRange,
    pub accuracy: u32,
    pub is_boss: bool,
    /// Skips the next attack, then clears.
    pub is_confused: bool,
    /// While positive, incoming weapon damage is multiplied.
    pub debuff_turns: u32,
}
impl Enemy {
    pub fn from_def(def: &EnemyDef) -> Enemy {
        Enemy {
            key: def.key.clone(),
            name: def.name.clone(),
            health: HealthState::new_at_max(def.max_hp),
            damage: def.damage,
            accuracy: def.accuracy,
            is_boss: def.special.as_deref() == Some("boss"),
            is_confused: false,
            debuff_turns: 0,
        }
    }

    pub fn is_soaked(&self) -> bool {
        self.debuff_turns > 0
    }
}
impl LivingEntity for Enemy {
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
