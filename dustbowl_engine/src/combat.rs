//! Combat module
//!
//! Resolves a single encounter between the player and one enemy. A round is the player's
//! action followed (unless combat already ended) by the enemy's turn.
//!
//! The resolver can be driven interactively with [`Combat::resolve`], or one action at a
//! time with [`Combat::act`].

use dustbowl_data::{UtilityEffect, WeaponDef};
use log::info;
use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::enemy::Enemy;
use crate::error::{EngineError, EngineResult};
use crate::health::{DamageOutcome, LivingEntity};
use crate::input::{InputSource, read_token};
use crate::player::{CombatBuff, Player};
use crate::view::{StatusKind, View, ViewItem, WeaponLine};

/// Chance (percent) that a weapon hit is critical.
pub const CRIT_CHANCE_PERCENT: u32 = 10;
/// Enemy turns covered by a debuff utility.
pub const DEBUFF_TURNS: u32 = 2;
pub const BASE_FLEE_CHANCE: i32 = 50;
pub const INVIS_WATCH_FLEE_BONUS: i32 = 40;

/// Terminal result of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Fled,
    PlayerDead,
}

/// A decision made at the `PlayerChoosing` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Use the n-th (zero-based) entry of [`Player::combat_items`].
    Attack(usize),
    Inspect,
    Flee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    PlayerChoosing,
    Resolving(PlayerAction),
    EnemyActing,
    Terminal(Outcome),
}

/// Success chance for a flee attempt. Unclamped: values at or below zero always fail and
/// values of 100 or more always succeed. Computed in `i64` so any content speed is safe.
pub fn flee_chance(speed: i32, has_invis_watch: bool) -> i64 {
    let bonus = if has_invis_watch { INVIS_WATCH_FLEE_BONUS } else { 0 };
    i64::from(BASE_FLEE_CHANCE) + (i64::from(speed) - 100) + i64::from(bonus)
}

/// Final damage for a weapon hit.
///
/// Mini-crit and soak each multiply by 1.5 (rounding down after each step). A critical
/// hit ignores both and doubles the unmodified roll.
pub fn modified_damage(base: u32, mini_crit: bool, soaked: bool, critical: bool) -> u32 {
    if critical {
        return base.saturating_mul(2);
    }
    let mut damage = base;
    if mini_crit {
        damage = damage.saturating_mul(3) / 2;
    }
    if soaked {
        damage = damage.saturating_mul(3) / 2;
    }
    damage
}

pub struct Combat<'a> {
    player: &'a mut Player,
    enemy: &'a mut Enemy,
    turn: u32,
    phase: CombatPhase,
    /// Turn on which the pending mini-crit was granted.
    buff_granted_on: Option<u32>,
}

impl<'a> Combat<'a> {
    /// Set up an encounter, clearing any buffs that survived from an earlier fight.
    pub fn new(player: &'a mut Player, enemy: &'a mut Enemy) -> Self {
        player.reset_combat_flags();
        enemy.debuff_turns = 0;
        Self {
            player,
            enemy,
            turn: 0,
            phase: CombatPhase::PlayerChoosing,
            buff_granted_on: None,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    /// Number of player turns taken so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn player(&self) -> &Player {
        self.player
    }

    pub fn enemy(&self) -> &Enemy {
        self.enemy
    }

    /// Run the encounter to completion, prompting for each decision.
    ///
    /// # Errors
    /// Only non-recoverable errors escape: quitting, input failure.
    pub fn resolve(
        mut self,
        input: &mut dyn InputSource,
        dice: &mut dyn Dice,
        view: &mut View,
    ) -> EngineResult<Outcome> {
        info!(
            "combat start: {} ({} hp) vs {} ({} hp)",
            self.player.name,
            self.player.current_hp(),
            self.enemy.name,
            self.enemy.current_hp()
        );
        view.push(ViewItem::CombatStart {
            enemy: self.enemy.name.clone(),
            is_boss: self.enemy.is_boss,
        });
        loop {
            if let CombatPhase::Terminal(outcome) = self.phase {
                return Ok(outcome);
            }
            self.push_banner(view);
            let action = self.choose_action(input, view)?;
            self.act(action, dice, view)?;
        }
    }

    /// Perform one player decision and, if it consumed the turn, the enemy's reply.
    ///
    /// Shorthand for [`Combat::select`], [`Combat::resolve_action`] and [`Combat::enemy_step`].
    /// Returns the outcome once combat reaches a terminal state; further calls keep
    /// returning it without changing anything.
    ///
    /// # Errors
    /// - `InvalidChoice` for an out-of-range attack index
    /// - `EmptyInventorySlot` if the player has nothing to attack with
    ///
    /// Both leave combat state untouched.
    pub fn act(
        &mut self,
        action: PlayerAction,
        dice: &mut dyn Dice,
        view: &mut View,
    ) -> EngineResult<Option<Outcome>> {
        if let CombatPhase::Terminal(outcome) = self.phase {
            return Ok(Some(outcome));
        }
        self.select(action, view)?;
        if let Some(outcome) = self.resolve_action(dice, view)? {
            return Ok(Some(outcome));
        }
        Ok(self.enemy_step(dice, view))
    }

    /// `PlayerChoosing -> Resolving(action)`. Inspect is shown in place and stays on
    /// `PlayerChoosing`. Any other phase is left alone.
    ///
    /// # Errors
    /// `InvalidChoice` or `EmptyInventorySlot` for an unusable attack; the phase does not change.
    pub fn select(&mut self, action: PlayerAction, view: &mut View) -> EngineResult<()> {
        if self.phase != CombatPhase::PlayerChoosing {
            return Ok(());
        }
        match action {
            PlayerAction::Inspect => {
                self.inspect(view);
                return Ok(());
            },
            PlayerAction::Attack(idx) => {
                self.combat_item(idx)?;
            },
            PlayerAction::Flee => {},
        }
        self.player.is_dodging = false;
        self.turn += 1;
        self.phase = CombatPhase::Resolving(action);
        info!("combat turn {}: {:?}", self.turn, action);
        Ok(())
    }

    /// `Resolving -> EnemyActing`, or straight to `Terminal` on a kill or a clean escape.
    ///
    /// # Errors
    /// Only if the selected item vanished from the inventory since [`Combat::select`].
    pub fn resolve_action(&mut self, dice: &mut dyn Dice, view: &mut View) -> EngineResult<Option<Outcome>> {
        let action = match self.phase {
            CombatPhase::Resolving(action) => action,
            CombatPhase::Terminal(outcome) => return Ok(Some(outcome)),
            CombatPhase::PlayerChoosing | CombatPhase::EnemyActing => return Ok(None),
        };
        let player_result = match action {
            PlayerAction::Attack(idx) => {
                let weapon = self.combat_item(idx)?.clone();
                self.player_attack(&weapon, dice, view)
            },
            PlayerAction::Flee => self.player_flee(dice, view),
            PlayerAction::Inspect => None,
        };
        self.expire_stale_buff(view);
        if let Some(outcome) = player_result {
            return Ok(Some(self.finish(outcome, view)));
        }
        self.phase = CombatPhase::EnemyActing;
        Ok(None)
    }

    /// `EnemyActing -> PlayerChoosing`, or `Terminal(PlayerDead)`.
    pub fn enemy_step(&mut self, dice: &mut dyn Dice, view: &mut View) -> Option<Outcome> {
        match self.phase {
            CombatPhase::EnemyActing => {},
            CombatPhase::Terminal(outcome) => return Some(outcome),
            CombatPhase::PlayerChoosing | CombatPhase::Resolving(_) => return None,
        }
        if let Some(outcome) = self.enemy_turn(dice, view) {
            return Some(self.finish(outcome, view));
        }
        self.phase = CombatPhase::PlayerChoosing;
        None
    }

    fn finish(&mut self, outcome: Outcome, view: &mut View) -> Outcome {
        info!(
            "combat end after {} turns: {:?} ({} hp left)",
            self.turn,
            outcome,
            self.player.current_hp()
        );
        self.phase = CombatPhase::Terminal(outcome);
        self.player.reset_combat_flags();
        view.push(ViewItem::CombatEnd {
            enemy: self.enemy.name.clone(),
            outcome,
        });
        outcome
    }

    fn combat_item(&self, idx: usize) -> EngineResult<&WeaponDef> {
        let items = self.player.combat_items();
        if items.is_empty() {
            return Err(EngineError::EmptyInventorySlot);
        }
        items
            .get(idx)
            .copied()
            .ok_or_else(|| EngineError::InvalidChoice {
                token: (idx + 1).to_string(),
            })
    }

    fn push_banner(&self, view: &mut View) {
        view.push(ViewItem::TurnBanner {
            turn: self.turn + 1,
            player_hp: self.player.current_hp(),
            player_max_hp: self.player.max_hp(),
            enemy_hp: self.enemy.current_hp(),
            enemy_max_hp: self.enemy.max_hp(),
        });
    }

    fn inspect(&self, view: &mut View) {
        self.player.show_stats(view);
        self.player.show_inventory(view);
    }

    /// Prompt until a turn-consuming action is chosen. Inspect is handled in place.
    fn choose_action(&self, input: &mut dyn InputSource, view: &mut View) -> EngineResult<PlayerAction> {
        loop {
            view.push(ViewItem::ActionMenu);
            let token = read_token(input, view, self.player, "Choose an action (1-3):")?;
            match token.as_str() {
                "1" | "attack" => match self.choose_weapon(input, view) {
                    Ok(idx) => return Ok(PlayerAction::Attack(idx)),
                    Err(err) if err.is_recoverable() => view.push(ViewItem::Error(err.to_string())),
                    Err(err) => return Err(err),
                },
                "2" | "inspect" => self.inspect(view),
                "3" | "flee" => return Ok(PlayerAction::Flee),
                _ => view.push(ViewItem::Error("That's not a valid command.".into())),
            }
        }
    }

    fn choose_weapon(&self, input: &mut dyn InputSource, view: &mut View) -> EngineResult<usize> {
        let items = self.player.combat_items();
        if items.is_empty() {
            return Err(EngineError::EmptyInventorySlot);
        }
        let lines: Vec<WeaponLine> = items.iter().map(|w| WeaponLine::from_weapon(w)).collect();
        let prompt = format!("Enter weapon number (1-{}):", items.len());
        loop {
            view.push(ViewItem::WeaponMenu(lines.clone()));
            let token = read_token(input, view, self.player, &prompt)?;
            match token.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                _ => view.push(ViewItem::Error("Invalid weapon choice.".into())),
            }
        }
    }

    /// Use a weapon or utility. Returns `Won` if the enemy dropped.
    fn player_attack(&mut self, weapon: &WeaponDef, dice: &mut dyn Dice, view: &mut View) -> Option<Outcome> {
        if weapon.utility {
            if let Some(effect) = weapon.effect {
                self.use_utility(&weapon.name, effect, view);
            }
            return None;
        }

        view.push(ViewItem::WeaponAttack {
            attacker: self.player.name.clone(),
            weapon: weapon.name.clone(),
        });
        let mut outcome = None;
        let to_hit = dice.roll_percent();
        if to_hit <= weapon.accuracy {
            let base = dice.roll(weapon.damage.min, weapon.damage.max);
            let mini_crit = self.player.combat_buff == CombatBuff::MiniCrit;
            let soaked = self.enemy.is_soaked();
            let critical = dice.roll_percent() <= CRIT_CHANCE_PERCENT;
            let amount = modified_damage(base, mini_crit, soaked, critical);
            info!(
                "{} hits {} with {} for {amount} (roll {base}, mini_crit={mini_crit}, soaked={soaked}, \
                 crit={critical})",
                self.player.name, self.enemy.name, weapon.key
            );
            let result = self.enemy.take_damage(amount);
            view.push(ViewItem::DamageDealt {
                target: self.enemy.name.clone(),
                amount,
                hp_after: self.enemy.current_hp(),
                max_hp: self.enemy.max_hp(),
                mini_crit,
                soaked,
                critical,
            });
            if result == DamageOutcome::Dead {
                view.push(ViewItem::CharacterDefeated {
                    name: self.enemy.name.clone(),
                    is_player: false,
                });
                outcome = Some(Outcome::Won);
            }
        } else {
            info!("{} misses with {} (roll {to_hit})", self.player.name, weapon.key);
            view.push(ViewItem::AttackMissed {
                attacker: self.player.name.clone(),
            });
        }

        // any pending buff is spent by the attempt, hit or miss
        if self.player.combat_buff != CombatBuff::None {
            self.clear_buff(view);
        }
        outcome
    }

    fn use_utility(&mut self, name: &str, effect: UtilityEffect, view: &mut View) {
        info!("{} uses {name}: {effect:?}", self.player.name);
        view.push(ViewItem::UtilityUsed { name: name.to_string() });
        match effect {
            UtilityEffect::Heal { amount } => self.heal_player(amount, view),
            UtilityEffect::Dodge => {
                self.player.is_dodging = true;
                view.push(ViewItem::StatusApplied {
                    target: self.player.name.clone(),
                    status: StatusKind::Dodging,
                });
            },
            UtilityEffect::Buff => self.grant_buff(view),
            UtilityEffect::HealAndBuff { amount } => {
                self.heal_player(amount, view);
                self.grant_buff(view);
            },
            UtilityEffect::Debuff => {
                self.enemy.debuff_turns = DEBUFF_TURNS;
                view.push(ViewItem::StatusApplied {
                    target: self.enemy.name.clone(),
                    status: StatusKind::Soaked,
                });
            },
        }
    }

    fn heal_player(&mut self, amount: u32, view: &mut View) {
        let healed = self.player.heal(amount);
        view.push(ViewItem::CharacterHealed {
            name: self.player.name.clone(),
            amount: healed,
            hp_after: self.player.current_hp(),
            max_hp: self.player.max_hp(),
        });
    }

    fn grant_buff(&mut self, view: &mut View) {
        self.player.combat_buff = CombatBuff::MiniCrit;
        self.buff_granted_on = Some(self.turn);
        view.push(ViewItem::StatusApplied {
            target: self.player.name.clone(),
            status: StatusKind::MiniCrit,
        });
    }

    fn clear_buff(&mut self, view: &mut View) {
        self.player.combat_buff = CombatBuff::None;
        self.buff_granted_on = None;
        view.push(ViewItem::StatusExpired {
            target: self.player.name.clone(),
            status: StatusKind::MiniCrit,
        });
    }

    /// A mini-crit survives the turn it was granted in plus one more player turn.
    fn expire_stale_buff(&mut self, view: &mut View) {
        let stale = self.buff_granted_on.is_some_and(|t| t < self.turn);
        if self.player.combat_buff == CombatBuff::MiniCrit && stale {
            self.clear_buff(view);
        }
    }

    fn player_flee(&mut self, dice: &mut dyn Dice, view: &mut View) -> Option<Outcome> {
        let chance = flee_chance(self.player.speed, self.player.has_invis_watch);
        view.push(ViewItem::FleeAttempt {
            cloaked: self.player.has_invis_watch,
        });
        let roll = i64::from(dice.roll_percent());
        info!("{} tries to flee: roll {roll} vs chance {chance}", self.player.name);
        if roll <= chance {
            Some(Outcome::Fled)
        } else {
            view.push(ViewItem::FleeFailed);
            None
        }
    }

    /// The enemy's reply. Returns `PlayerDead` if the player dropped.
    fn enemy_turn(&mut self, dice: &mut dyn Dice, view: &mut View) -> Option<Outcome> {
        if self.player.is_dodging {
            self.player.is_dodging = false;
            view.push(ViewItem::AttackDodged {
                attacker: self.enemy.name.clone(),
            });
            view.push(ViewItem::StatusExpired {
                target: self.player.name.clone(),
                status: StatusKind::Dodging,
            });
            return None;
        }

        if self.enemy.debuff_turns > 0 {
            self.enemy.debuff_turns -= 1;
            if self.enemy.debuff_turns == 0 {
                view.push(ViewItem::StatusExpired {
                    target: self.enemy.name.clone(),
                    status: StatusKind::Soaked,
                });
            }
        }

        view.push(ViewItem::EnemyAttack {
            enemy: self.enemy.name.clone(),
        });
        if self.enemy.is_confused {
            self.enemy.is_confused = false;
            view.push(ViewItem::EnemyConfused {
                name: self.enemy.name.clone(),
            });
            return None;
        }

        let to_hit = dice.roll_percent();
        if to_hit > self.enemy.accuracy {
            view.push(ViewItem::AttackMissed {
                attacker: self.enemy.name.clone(),
            });
            return None;
        }
        let amount = dice.roll(self.enemy.damage.min, self.enemy.damage.max);
        info!("{} hits {} for {amount}", self.enemy.name, self.player.name);
        let result = self.player.take_damage(amount);
        view.push(ViewItem::DamageDealt {
            target: self.player.name.clone(),
            amount,
            hp_after: self.player.current_hp(),
            max_hp: self.player.max_hp(),
            mini_crit: false,
            soaked: false,
            critical: false,
        });
        if result == DamageOutcome::Dead {
            view.push(ViewItem::CharacterDefeated {
                name: self.player.name.clone(),
                is_player: true,
            });
            return Some(Outcome::PlayerDead);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::health::HealthState;
    use crate::input::ScriptedInput;
    use dustbowl_data::{DamageRange, EnemyDef};

    fn weapon(key: &str, min: u32, max: u32, accuracy: u32) -> WeaponDef {
        WeaponDef {
            key: key.into(),
            name: key.to_uppercase(),
            damage: DamageRange::new(min, max),
            accuracy,
            desc: String::new(),
            utility: false,
            effect: None,
        }
    }

    fn utility(key: &str, effect: Option<UtilityEffect>) -> WeaponDef {
        WeaponDef {
            key: key.into(),
            name: key.to_uppercase(),
            damage: DamageRange::new(0, 0),
            accuracy: 100,
            desc: String::new(),
            utility: true,
            effect,
        }
    }

    fn enemy(max_hp: u32) -> Enemy {
        Enemy::from_def(&EnemyDef {
            key: "soldier_bot".into(),
            name: "BLU Soldier Bot".into(),
            max_hp,
            damage: DamageRange::new(20, 40),
            accuracy: 80,
            special: None,
        })
    }

    fn player_with(items: Vec<WeaponDef>) -> Player {
        let mut player = Player {
            name: "Tester".into(),
            health: HealthState::new_at_max(200),
            ..Player::default()
        };
        for item in items {
            player.equip(item);
        }
        player
    }

    #[test]
    fn flee_chance_formula() {
        assert_eq!(flee_chance(100, false), 50);
        assert_eq!(flee_chance(133, false), 83);
        assert_eq!(flee_chance(77, false), 27);
        assert_eq!(flee_chance(107, true), 97);
        assert_eq!(flee_chance(200, false), 150);
        assert_eq!(flee_chance(0, false), -50);
    }

    #[test]
    fn flee_chance_is_monotonic_in_speed() {
        for watch in [false, true] {
            let mut last = i64::MIN;
            for speed in -50..300 {
                let chance = flee_chance(speed, watch);
                assert!(chance >= last);
                last = chance;
            }
        }
        for speed in [50, 100, 133] {
            assert_eq!(flee_chance(speed, true) - flee_chance(speed, false), 40);
        }
    }

    #[test]
    fn flee_chance_handles_extreme_speeds() {
        assert_eq!(flee_chance(i32::MIN, false), i64::from(i32::MIN) - 50);
        assert_eq!(flee_chance(i32::MAX, true), i64::from(i32::MAX) - 10);
        assert!(flee_chance(i32::MIN, true) < 1);
        assert!(flee_chance(i32::MAX, false) >= 100);
    }

    #[test]
    fn extreme_speeds_flee_without_panicking() {
        let mut view = View::captured();
        let mut bot = enemy(100);

        let mut slow = player_with(vec![weapon("bat", 30, 40, 95)]);
        slow.speed = i32::MIN;
        let mut dice = ScriptedDice::new([1, 99]);
        let mut combat = Combat::new(&mut slow, &mut bot);
        assert_eq!(combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap(), None);

        let mut fast = player_with(vec![weapon("bat", 30, 40, 95)]);
        fast.speed = i32::MAX;
        let mut dice = ScriptedDice::new([100]);
        let mut combat = Combat::new(&mut fast, &mut bot);
        assert_eq!(
            combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap(),
            Some(Outcome::Fled)
        );
    }

    #[test]
    fn modifiers_compose_and_crit_uses_base() {
        assert_eq!(modified_damage(50, false, false, false), 50);
        assert_eq!(modified_damage(50, true, false, false), 75);
        assert_eq!(modified_damage(50, false, true, false), 75);
        assert_eq!(modified_damage(50, true, true, false), 112);
        assert_eq!(modified_damage(51, true, false, false), 76);
        for (mini, soak) in [(false, false), (true, false), (false, true), (true, true)] {
            assert_eq!(modified_damage(50, mini, soak, true), 100);
        }
    }

    #[test]
    fn to_hit_roll_above_accuracy_misses() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        let mut bot = enemy(180);
        let mut view = View::captured();
        // to-hit 86 misses, enemy then misses with 99
        let mut dice = ScriptedDice::new([86, 99]);
        let mut combat = Combat::new(&mut player, &mut bot);
        assert_eq!(combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap(), None);
        assert_eq!(combat.enemy().current_hp(), 180);
        assert!(view.items.iter().any(ViewItem::is_attack_missed));
    }

    #[test]
    fn enemy_hit_on_ten_hp_player_is_lethal() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        player.health = HealthState::new_at_max(200);
        player.take_damage(190);
        let mut bot = enemy(180);
        bot.damage = DamageRange::new(15, 15);
        let mut view = View::captured();
        // player misses (90 > 85), enemy hits (10 <= 80) for 15
        let mut dice = ScriptedDice::new([90, 10, 15]);
        let mut combat = Combat::new(&mut player, &mut bot);
        let outcome = combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(outcome, Some(Outcome::PlayerDead));
        assert_eq!(combat.phase(), CombatPhase::Terminal(Outcome::PlayerDead));
        assert_eq!(combat.player().current_hp(), 0);
    }

    #[test]
    fn buff_applies_once_then_damage_is_plain() {
        let mut player = player_with(vec![
            weapon("shotgun", 40, 70, 85),
            utility("buff_banner", Some(UtilityEffect::Buff)),
        ]);
        let mut bot = enemy(500);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([
            99, // enemy misses after the banner
            1, 50, 50, // hit, roll 50, no crit
            99, // enemy misses
            1, 50, 50, // hit, roll 50, no crit
            99, // enemy misses
        ]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().combat_buff, CombatBuff::MiniCrit);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.enemy().current_hp(), 425);
        assert_eq!(combat.player().combat_buff, CombatBuff::None);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.enemy().current_hp(), 375);
    }

    #[test]
    fn buff_is_spent_by_a_miss() {
        let mut player = player_with(vec![
            weapon("shotgun", 40, 70, 85),
            utility("buff_banner", Some(UtilityEffect::Buff)),
        ]);
        let mut bot = enemy(500);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([99, 90, 99]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap();
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().combat_buff, CombatBuff::None);
        assert_eq!(combat.enemy().current_hp(), 500);
    }

    #[test]
    fn unused_buff_expires_after_one_full_turn() {
        let mut player = player_with(vec![
            weapon("shotgun", 40, 70, 85),
            utility("buff_banner", Some(UtilityEffect::Buff)),
        ]);
        player.speed = 0;
        let mut bot = enemy(500);
        let mut view = View::captured();
        // banner; enemy miss; flee fails (chance -50); enemy miss
        let mut dice = ScriptedDice::new([99, 1, 99]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap();
        combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().combat_buff, CombatBuff::None);
    }

    #[test]
    fn crit_ignores_pending_mini_crit() {
        let mut player = player_with(vec![
            weapon("shotgun", 40, 70, 85),
            utility("buff_banner", Some(UtilityEffect::Buff)),
        ]);
        let mut bot = enemy(500);
        let mut view = View::captured();
        // banner; enemy misses; hit for 60 with crit roll 5; enemy misses
        let mut dice = ScriptedDice::new([99, 1, 60, 5, 99]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap();
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.enemy().current_hp(), 380);
        assert_eq!(combat.player().combat_buff, CombatBuff::None);
        assert!(view.items.iter().any(|i| matches!(
            i,
            ViewItem::DamageDealt {
                critical: true,
                mini_crit: true,
                amount: 120,
                ..
            }
        )));
    }

    #[test]
    fn soaked_enemy_takes_extra_damage_for_one_attack() {
        let mut player = player_with(vec![
            weapon("kukri", 55, 75, 95),
            utility("jarate", Some(UtilityEffect::Debuff)),
        ]);
        let mut bot = enemy(500);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([
            99, // jarate, enemy misses: debuff 2 -> 1
            1, 60, 50, 99, // soaked hit for 90; enemy: debuff 1 -> 0, misses
            1, 60, 50, 99, // plain hit for 60
        ]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap();
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.enemy().current_hp(), 410);
        assert!(view.items.iter().any(|i| matches!(i, ViewItem::StatusExpired { status: StatusKind::Soaked, .. })));
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.enemy().current_hp(), 350);
    }

    #[test]
    fn dodge_negates_exactly_one_enemy_turn() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95), utility("bonk", Some(UtilityEffect::Dodge))]);
        let mut bot = enemy(500);
        bot.damage = DamageRange::new(20, 20);
        let mut view = View::captured();
        // bonk: enemy turn consumes no rolls; then bat misses and enemy hits for 20
        let mut dice = ScriptedDice::new([99, 1, 20]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().current_hp(), 200);
        assert!(!combat.player().is_dodging);
        assert_eq!(dice.remaining(), 3);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().current_hp(), 180);
    }

    #[test]
    fn confused_enemy_skips_one_attack() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        let mut bot = enemy(500);
        bot.is_confused = true;
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([99, 99, 1, 25]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().current_hp(), 200);
        assert!(!combat.enemy().is_confused);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().current_hp(), 175);
    }

    #[test]
    fn killing_blow_ends_combat_before_enemy_turn() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        let mut bot = enemy(50);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([1, 60, 50]);
        let mut combat = Combat::new(&mut player, &mut bot);
        let outcome = combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(outcome, Some(Outcome::Won));
        assert_eq!(dice.remaining(), 0);
        assert!(!view.items.iter().any(ViewItem::is_enemy_attack));
    }

    #[test]
    fn successful_flee_skips_enemy_turn() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        player.speed = 133;
        let mut bot = enemy(100);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([83, 1, 40]);
        let mut combat = Combat::new(&mut player, &mut bot);
        let outcome = combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap();
        assert_eq!(outcome, Some(Outcome::Fled));
        assert_eq!(dice.remaining(), 2);
    }

    #[test]
    fn failed_flee_gives_enemy_a_turn() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        let mut bot = enemy(100);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([51, 1, 30]);
        let mut combat = Combat::new(&mut player, &mut bot);
        assert_eq!(combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap(), None);
        assert_eq!(combat.player().current_hp(), 170);
    }

    #[test]
    fn terminal_state_has_no_transitions() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        let mut bot = enemy(10);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([1, 30, 50]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        let mut more = ScriptedDice::new([1, 1, 1]);
        assert_eq!(
            combat.act(PlayerAction::Flee, &mut more, &mut view).unwrap(),
            Some(Outcome::Won)
        );
        assert_eq!(more.remaining(), 3);
    }

    #[test]
    fn inspect_does_not_consume_the_turn() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        let mut bot = enemy(100);
        let mut view = View::captured();
        let mut dice = ScriptedDice::default();
        let mut combat = Combat::new(&mut player, &mut bot);
        assert_eq!(combat.act(PlayerAction::Inspect, &mut dice, &mut view).unwrap(), None);
        assert_eq!(combat.turn(), 0);
        assert_eq!(combat.phase(), CombatPhase::PlayerChoosing);
        assert!(view.items.iter().any(ViewItem::is_player_stats));
    }

    #[test]
    fn story_utilities_leave_nothing_to_attack_with() {
        let mut player = player_with(vec![utility("sapper", None), utility("disguise_kit", None)]);
        let mut bot = enemy(100);
        let mut view = View::captured();
        let mut dice = ScriptedDice::default();
        let mut combat = Combat::new(&mut player, &mut bot);
        let err = combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInventorySlot));
        assert_eq!(combat.turn(), 0);
    }

    #[test]
    fn out_of_range_attack_index_is_invalid_choice() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        let mut bot = enemy(100);
        let mut view = View::captured();
        let mut dice = ScriptedDice::default();
        let mut combat = Combat::new(&mut player, &mut bot);
        let err = combat.act(PlayerAction::Attack(3), &mut dice, &mut view).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChoice { .. }));
        assert_eq!(combat.phase(), CombatPhase::PlayerChoosing);
    }

    #[test]
    fn kritzkrieg_heals_and_buffs() {
        let mut player = player_with(vec![utility(
            "kritzkrieg",
            Some(UtilityEffect::HealAndBuff { amount: 30 }),
        )]);
        player.take_damage(50);
        let mut bot = enemy(100);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([99]);
        let mut combat = Combat::new(&mut player, &mut bot);
        combat.act(PlayerAction::Attack(0), &mut dice, &mut view).unwrap();
        assert_eq!(combat.player().current_hp(), 180);
        assert_eq!(combat.player().combat_buff, CombatBuff::MiniCrit);
    }

    #[test]
    fn heal_utility_caps_at_max_without_a_to_hit_roll() {
        let mut player = player_with(vec![
            weapon("shotgun", 40, 70, 85),
            utility("sandvich", Some(UtilityEffect::Heal { amount: 75 })),
        ]);
        player.take_damage(40);
        let mut bot = enemy(100);
        let mut view = View::captured();
        // only the enemy's to-hit roll is consumed
        let mut dice = ScriptedDice::new([99, 1, 1]);
        let mut combat = Combat::new(&mut player, &mut bot);
        assert_eq!(combat.act(PlayerAction::Attack(1), &mut dice, &mut view).unwrap(), None);
        assert_eq!(combat.player().current_hp(), 200);
        assert_eq!(combat.enemy().current_hp(), 100);
        assert_eq!(dice.remaining(), 2);
        assert!(view.items.iter().any(|i| matches!(i, ViewItem::CharacterHealed { amount: 40, .. })));
    }

    #[test]
    fn invis_watch_turns_a_failed_flee_into_an_escape() {
        let mut bot = enemy(100);
        let mut view = View::captured();

        let mut spy = player_with(vec![weapon("knife", 40, 50, 95)]);
        spy.speed = 107;
        spy.has_invis_watch = true;
        let mut dice = ScriptedDice::new([90]);
        let mut combat = Combat::new(&mut spy, &mut bot);
        assert_eq!(
            combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap(),
            Some(Outcome::Fled)
        );

        let mut spy = player_with(vec![weapon("knife", 40, 50, 95)]);
        spy.speed = 107;
        let mut dice = ScriptedDice::new([90, 99]);
        let mut combat = Combat::new(&mut spy, &mut bot);
        assert_eq!(combat.act(PlayerAction::Flee, &mut dice, &mut view).unwrap(), None);
        assert!(view.items.iter().any(ViewItem::is_flee_failed));
    }

    #[test]
    fn phases_can_be_stepped_one_at_a_time() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        let mut bot = enemy(500);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([90, 99]);
        let mut combat = Combat::new(&mut player, &mut bot);

        combat.select(PlayerAction::Inspect, &mut view).unwrap();
        assert_eq!(combat.phase(), CombatPhase::PlayerChoosing);

        combat.select(PlayerAction::Attack(0), &mut view).unwrap();
        assert_eq!(combat.phase(), CombatPhase::Resolving(PlayerAction::Attack(0)));
        assert_eq!(dice.remaining(), 2);

        assert_eq!(combat.resolve_action(&mut dice, &mut view).unwrap(), None);
        assert_eq!(combat.phase(), CombatPhase::EnemyActing);
        assert_eq!(dice.remaining(), 1);

        assert_eq!(combat.enemy_step(&mut dice, &mut view), None);
        assert_eq!(combat.phase(), CombatPhase::PlayerChoosing);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn steps_out_of_order_are_ignored() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        let mut bot = enemy(500);
        let mut view = View::captured();
        let mut dice = ScriptedDice::new([1, 1, 1]);
        let mut combat = Combat::new(&mut player, &mut bot);
        assert_eq!(combat.resolve_action(&mut dice, &mut view).unwrap(), None);
        assert_eq!(combat.enemy_step(&mut dice, &mut view), None);
        assert_eq!(combat.phase(), CombatPhase::PlayerChoosing);
        assert_eq!(dice.remaining(), 3);
    }

    #[test]
    fn new_encounter_clears_leftover_flags() {
        let mut player = player_with(vec![weapon("bat", 30, 40, 95)]);
        player.combat_buff = CombatBuff::MiniCrit;
        player.is_dodging = true;
        let mut bot = enemy(100);
        bot.debuff_turns = 2;
        let combat = Combat::new(&mut player, &mut bot);
        assert_eq!(combat.player().combat_buff, CombatBuff::None);
        assert!(!combat.player().is_dodging);
        assert_eq!(combat.enemy().debuff_turns, 0);
    }

    #[test]
    fn interactive_resolve_reprompts_on_bad_input() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        let mut bot = enemy(60);
        let mut view = View::captured();
        let mut input = ScriptedInput::new(["dance", "2", "stats", "1", "9", "1"]);
        let mut dice = ScriptedDice::new([1, 70, 50]);
        let outcome = Combat::new(&mut player, &mut bot)
            .resolve(&mut input, &mut dice, &mut view)
            .unwrap();
        assert_eq!(outcome, Outcome::Won);
        let errors = view.transcript().filter(|i| i.is_error()).count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn quitting_mid_combat_propagates() {
        let mut player = player_with(vec![weapon("shotgun", 40, 70, 85)]);
        let mut bot = enemy(60);
        let mut view = View::captured();
        let mut input = ScriptedInput::new(["1", "quit"]);
        let mut dice = ScriptedDice::default();
        let err = Combat::new(&mut player, &mut bot)
            .resolve(&mut input, &mut dice, &mut view)
            .unwrap_err();
        assert!(matches!(err, EngineError::Quit));
    }
}
