//! View module.
//!
//! The engine never prints directly. Combat and navigation push structured [`ViewItem`]s
//! into the [`View`], which renders them (or captures them for tests) each time the engine
//! is about to wait for input.
use colored::Colorize;
use dustbowl_data::{ClassDef, ItemKind, WeaponDef};
use log::debug;
use serde::Serialize;
use textwrap::{fill, termwidth};
use variantly::Variantly;

use crate::combat::Outcome;
use crate::navigator::Choice;
use crate::style::{GameStyle, indented_block, normal_block};

const ICON_ERROR: &str = "⚠︎"; // U+26A0 U+FE0E
const ICON_ENGINE: &str = "⚙";
const ICON_STATUS: &str = "⚕";
const ICON_HARMED: &str = "\u{2623}"; // biohazard sign
const ICON_HEALED: &str = "\u{2624}"; // caduceus
const ICON_DEATH: &str = "☠";
const ICON_ITEM: &str = "➕";

/// Where flushed items go.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewMode {
    /// Render to the terminal.
    Terminal,
    /// Keep every flushed item in `captured` instead of printing.
    Captured,
}

#[derive(Debug, Clone)]
pub struct View {
    pub width: usize,
    pub mode: ViewMode,
    pub items: Vec<ViewItem>,
    pub captured: Vec<ViewItem>,
}
impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    /// Create a new empty view that renders to the terminal.
    pub fn new() -> Self {
        Self {
            width: termwidth(),
            mode: ViewMode::Terminal,
            items: Vec::new(),
            captured: Vec::new(),
        }
    }

    /// Create a view that records output instead of printing it.
    pub fn captured() -> Self {
        Self {
            mode: ViewMode::Captured,
            ..Self::new()
        }
    }

    pub fn push(&mut self, item: ViewItem) {
        self.items.push(item);
    }

    /// Everything pushed so far, flushed or not (captured mode only keeps flushed history).
    pub fn transcript(&self) -> impl Iterator<Item = &ViewItem> {
        self.captured.iter().chain(self.items.iter())
    }

    /// Display (or capture) all pending items.
    pub fn flush(&mut self) {
        for item in &self.items {
            if let Ok(line) = serde_json::to_string(item) {
                debug!("view: {line}");
            }
        }
        match self.mode {
            ViewMode::Terminal => {
                self.width = termwidth();
                for item in &self.items {
                    render(item, self.width);
                }
                self.items.clear();
            },
            ViewMode::Captured => self.captured.append(&mut self.items),
        }
    }
}

/// Status effects that can be applied to or expire from a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKind {
    Dodging,
    MiniCrit,
    Soaked,
}
impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Dodging => "dodging",
            StatusKind::MiniCrit => "mini-crit",
            StatusKind::Soaked => "soaked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaponLine {
    pub name: String,
    pub min: u32,
    pub max: u32,
    pub accuracy: u32,
    pub desc: String,
}
impl WeaponLine {
    pub fn from_weapon(weapon: &WeaponDef) -> Self {
        Self {
            name: weapon.name.clone(),
            min: weapon.damage.min,
            max: weapon.damage.max,
            accuracy: weapon.accuracy,
            desc: weapon.desc.clone(),
        }
    }
}

pub type InventoryLine = WeaponLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLine {
    pub name: String,
    pub max_hp: u32,
    pub speed: i32,
}
impl ClassLine {
    pub fn from_class(class: &ClassDef) -> Self {
        Self {
            name: class.name.clone(),
            max_hp: class.max_hp,
            speed: class.speed,
        }
    }
}

/// Every kind of message the engine can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Variantly)]
pub enum ViewItem {
    Title { title: String, map_name: String },
    Intro(String),
    LocationDescription(String),
    Ending { description: Option<String>, text: String },
    ItemFound { kind: ItemKind, amount: u32 },
    Choices(Vec<Choice>),
    ClassMenu(Vec<ClassLine>),
    LoadoutMenu { slot: String, options: Vec<WeaponLine> },
    Equipped { name: String, desc: String },
    CombatStart { enemy: String, is_boss: bool },
    TurnBanner {
        turn: u32,
        player_hp: u32,
        player_max_hp: u32,
        enemy_hp: u32,
        enemy_max_hp: u32,
    },
    ActionMenu,
    WeaponMenu(Vec<WeaponLine>),
    WeaponAttack { attacker: String, weapon: String },
    UtilityUsed { name: String },
    AttackMissed { attacker: String },
    DamageDealt {
        target: String,
        amount: u32,
        hp_after: u32,
        max_hp: u32,
        mini_crit: bool,
        soaked: bool,
        critical: bool,
    },
    CharacterHealed { name: String, amount: u32, hp_after: u32, max_hp: u32 },
    CharacterDefeated { name: String, is_player: bool },
    StatusApplied { target: String, status: StatusKind },
    StatusExpired { target: String, status: StatusKind },
    EnemyAttack { enemy: String },
    AttackDodged { attacker: String },
    EnemyConfused { name: String },
    FleeAttempt { cloaked: bool },
    FleeFailed,
    CombatEnd { enemy: String, outcome: Outcome },
    PlayerStats { class_name: String, hp: u32, max_hp: u32, speed: i32 },
    Inventory(Vec<InventoryLine>),
    Error(String),
    EngineMessage(String),
}

#[allow(clippy::too_many_lines)]
fn render(item: &ViewItem, width: usize) {
    match item {
        ViewItem::Title { title, map_name } => {
            println!("{:=^width$}", "", width = width.min(60));
            println!("{:^width$}", title.bright_yellow().underline(), width = width.min(60));
            println!("{:=^width$}", "", width = width.min(60));
            if !map_name.is_empty() {
                println!("\nLoading map: {}...", map_name.subheading_style());
            }
        },
        ViewItem::Intro(text) | ViewItem::LocationDescription(text) => {
            println!("\n{}", fill(text, normal_block()).description_style());
        },
        ViewItem::Ending { description, text } => {
            if let Some(desc) = description {
                println!("\n{}", fill(desc, normal_block()).description_style());
            }
            println!("\n{}", fill(text, normal_block()).ending_style());
        },
        ViewItem::ItemFound { kind, .. } => {
            let msg = match kind {
                ItemKind::Health => "You found a health pack! You patch yourself up.",
                ItemKind::Ammo => "You found an ammo crate! Resupplied.",
            };
            println!("{:<4}{}", ICON_ITEM.bright_green(), msg);
        },
        ViewItem::Choices(choices) => {
            println!("\n{}", "What do you do?".subheading_style());
            for choice in choices {
                println!("  {}. {}", choice.token.choice_style(), choice.label);
            }
        },
        ViewItem::ClassMenu(classes) => {
            println!("\nThe Administrator needs you. Choose your class:");
            for (idx, class) in classes.iter().enumerate() {
                println!(
                    "  {}. {} (HP: {}, Speed: {})",
                    idx + 1,
                    class.name.player_style(),
                    class.max_hp,
                    class.speed
                );
            }
        },
        ViewItem::LoadoutMenu { slot, options } => {
            println!("\nChoose your {} weapon:", slot.to_uppercase().bold());
            for (idx, weapon) in options.iter().enumerate() {
                println!("  {}. {} - ({})", idx + 1, weapon.name.weapon_style(), weapon.desc);
            }
        },
        ViewItem::Equipped { name, desc } => {
            println!("  {} equipped. ({desc})", name.weapon_style());
        },
        ViewItem::CombatStart { enemy, is_boss } => {
            println!("\n{}", "--- BATTLE START ---".bold());
            if *is_boss {
                println!("The {} looms over the point!", enemy.enemy_style());
            } else {
                println!("A wild {} appears!", enemy.enemy_style());
            }
        },
        ViewItem::TurnBanner {
            turn,
            player_hp,
            player_max_hp,
            enemy_hp,
            enemy_max_hp,
        } => {
            println!("\n{}", format!("--- Turn {turn} ---").section_style());
            println!("Your HP: {player_hp}/{player_max_hp}");
            println!("Enemy HP: {enemy_hp}/{enemy_max_hp}");
        },
        ViewItem::ActionMenu => {
            println!("\nWhat will you do?");
            println!("  1. Attack");
            println!("  2. Check Stats / Inventory");
            println!("  3. Flee");
        },
        ViewItem::WeaponMenu(weapons) => {
            println!("Choose your weapon:");
            for (idx, weapon) in weapons.iter().enumerate() {
                println!(
                    "  {}. {} (Dmg: {}-{}, Acc: {}%)",
                    idx + 1,
                    weapon.name.weapon_style(),
                    weapon.min,
                    weapon.max,
                    weapon.accuracy
                );
            }
        },
        ViewItem::WeaponAttack { weapon, .. } => {
            println!("You attack with your {}!", weapon.weapon_style());
        },
        ViewItem::UtilityUsed { name } => println!("You use your {}!", name.weapon_style()),
        ViewItem::AttackMissed { attacker } => println!("{}'s attack misses!", attacker),
        ViewItem::DamageDealt {
            target,
            amount,
            hp_after,
            max_hp,
            mini_crit,
            soaked,
            critical,
        } => {
            if *critical {
                println!("{}", "CRITICAL HIT!".bright_red().bold());
            } else {
                if *mini_crit {
                    println!("{}", "Mini-Crit!".bright_yellow());
                }
                if *soaked {
                    println!("{}", "Jarate damage!".yellow());
                }
            }
            println!(
                "{:<4}{} takes {} damage! ({hp_after}/{max_hp} HP remaining)",
                ICON_HARMED.bright_yellow(),
                target,
                amount.to_string().bright_red()
            );
        },
        ViewItem::CharacterHealed {
            name,
            amount,
            hp_after,
            max_hp,
        } => {
            println!(
                "{:<4}{} heals for {} HP! ({hp_after}/{max_hp} HP remaining)",
                ICON_HEALED.bright_blue(),
                name,
                amount.to_string().bright_green()
            );
        },
        ViewItem::CharacterDefeated { name, is_player } => {
            let styled = if *is_player { name.player_style() } else { name.enemy_style() };
            println!("{:<4}{styled} is down!", ICON_DEATH.red());
        },
        ViewItem::StatusApplied { target, status } => {
            println!(
                "{:<4}{target}: status {} applied",
                ICON_STATUS.yellow(),
                status.label().status_style()
            );
        },
        ViewItem::StatusExpired { target, status } => {
            println!(
                "{:<4}{target}: status {} wore off",
                ICON_STATUS.yellow(),
                status.label().status_style()
            );
        },
        ViewItem::EnemyAttack { enemy } => println!("{} attacks you!", enemy.enemy_style()),
        ViewItem::AttackDodged { attacker } => {
            println!("The {} attacks, but you dodge it!", attacker.enemy_style());
        },
        ViewItem::EnemyConfused { name } => {
            println!("{} is confused and misses its turn!", name.enemy_style());
        },
        ViewItem::FleeAttempt { cloaked } => {
            println!("You try to run away...");
            if *cloaked {
                println!("You use your Invisibility Watch to cloak...");
            }
        },
        ViewItem::FleeFailed => println!("You couldn't get away!"),
        ViewItem::CombatEnd { enemy, outcome } => match outcome {
            Outcome::Won => println!("\nYou have defeated the {}!", enemy.enemy_style()),
            Outcome::Fled => println!("\nYou successfully escaped!"),
            Outcome::PlayerDead => println!("\n{}", "You have been defeated.".red()),
        },
        ViewItem::PlayerStats {
            class_name,
            hp,
            max_hp,
            speed,
        } => {
            println!("\n{}", "--- YOUR STATS ---".subheading_style());
            println!("  Class: {}", class_name.player_style());
            println!("  Health: {hp} / {max_hp}");
            println!("  Speed Rating: {speed}");
        },
        ViewItem::Inventory(lines) => {
            println!("\n{}", "--- YOUR INVENTORY ---".subheading_style());
            if lines.is_empty() {
                println!("  You have no weapons!");
            }
            for (idx, line) in lines.iter().enumerate() {
                println!("  {}. {}", idx + 1, line.name.weapon_style());
                println!(
                    "{}",
                    fill(
                        &format!("- Damage: {}-{} | Accuracy: {}%", line.min, line.max, line.accuracy),
                        indented_block()
                    )
                );
                println!("{}", fill(&format!("- Desc: {}", line.desc), indented_block()));
            }
        },
        ViewItem::Error(msg) => {
            println!("{:<4}{}", ICON_ERROR.red(), msg.error_style());
        },
        ViewItem::EngineMessage(msg) => println!("{:<4}{}", ICON_ENGINE.dimmed(), msg),
    }
}
