//! Random rolls.
//!
//! Every to-hit, damage, crit, and flee roll goes through a single [`Dice`] so a run can be
//! seeded or scripted.
use std::collections::VecDeque;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait Dice {
    /// Roll uniformly in `[min, max]`, inclusive.
    fn roll(&mut self, min: u32, max: u32) -> u32;

    fn roll_percent(&mut self) -> u32 {
        self.roll(1, 100)
    }
}

/// `Dice` backed by a `rand` generator.
pub struct RngDice<R = StdRng> {
    rng: R,
}
impl RngDice<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}
impl<R: Rng> Dice for RngDice<R> {
    fn roll(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}

/// `Dice` that replays a fixed list of rolls, clamped into the requested range.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
}
impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}
impl Dice for ScriptedDice {
    fn roll(&mut self, min: u32, max: u32) -> u32 {
        match self.rolls.pop_front() {
            Some(roll) => roll.clamp(min, max.max(min)),
            None => {
                warn!("scripted dice exhausted; rolling minimum {min}");
                min
            },
        }
    }
}
