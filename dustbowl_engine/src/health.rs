//! Health Module
//!
//! Handles hit points for the player and enemies.
use std::cmp;

use serde::{Deserialize, Serialize};

/// Hit point pool for a living entity. `current_hp` never exceeds `max_hp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    max_hp: u32,
    current_hp: u32,
}
impl HealthState {
    /// Create a `HealthState` at full health.
    pub fn new_at_max(max_hp: u32) -> HealthState {
        HealthState {
            max_hp,
            current_hp: max_hp,
        }
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Do damage to health. Saturates at zero.
    ///
    /// Reports `Dead` only for the call that takes health from a positive value to zero.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.current_hp == 0 {
            return DamageOutcome::AlreadyDead;
        }
        self.current_hp = self.current_hp.saturating_sub(amount);
        if self.current_hp == 0 {
            DamageOutcome::Dead
        } else {
            DamageOutcome::Alive
        }
    }

    /// Heal the entity. Saturates at max health and returns the hp actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current_hp;
        self.current_hp = cmp::min(self.max_hp, self.current_hp.saturating_add(amount));
        self.current_hp - before
    }
}

/// Result of a single `take_damage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    Alive,
    Dead,
    AlreadyDead,
}

/// Abilities common to game entities that are alive
pub trait LivingEntity {
    fn name(&self) -> &str;
    fn health(&self) -> &HealthState;
    fn health_mut(&mut self) -> &mut HealthState;

    fn max_hp(&self) -> u32 {
        self.health().max_hp()
    }
    fn current_hp(&self) -> u32 {
        self.health().current_hp()
    }
    fn is_alive(&self) -> bool {
        self.health().is_alive()
    }
    fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        self.health_mut().take_damage(amount)
    }
    fn heal(&mut self, amount: u32) -> u32 {
        self.health_mut().heal(amount)
    }
}
