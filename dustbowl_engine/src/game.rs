//! Game loop.
//!
//! Builds the player (class menu, then loadout), introduces the map, and hands control to the
//! [`Navigator`] until an ending is reached.
use dustbowl_data::{ClassDef, LoadoutDef};
use log::info;

use crate::content::Content;
use crate::dice::Dice;
use crate::error::EngineResult;
use crate::health::LivingEntity;
use crate::input::{InputSource, read_token};
use crate::navigator::{Navigator, Progress};
use crate::player::Player;
use crate::view::{ClassLine, View, ViewItem, WeaponLine};

/// How a completed run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub player_name: String,
    pub class_key: String,
    pub ending: String,
    pub hp_left: u32,
    /// Number of locations entered, including the ending.
    pub steps: usize,
}

/// Parse a 1-based menu pick against a menu of `len` entries.
fn menu_pick(token: &str, len: usize) -> Option<usize> {
    token.parse::<usize>().ok().filter(|n| (1..=len).contains(n)).map(|n| n - 1)
}

/// Ask the player for a class from the content's class list.
///
/// # Errors
/// Propagates `Quit` and input failures.
pub fn choose_class<'c>(
    classes: &'c [ClassDef],
    placeholder: &Player,
    input: &mut dyn InputSource,
    view: &mut View,
) -> EngineResult<&'c ClassDef> {
    let menu: Vec<ClassLine> = classes.iter().map(ClassLine::from_class).collect();
    let prompt = format!("Enter a number (1-{}):", classes.len());
    loop {
        view.push(ViewItem::ClassMenu(menu.clone()));
        let token = read_token(input, view, placeholder, &prompt)?;
        match menu_pick(&token, classes.len()) {
            Some(idx) => return Ok(&classes[idx]),
            None => view.push(ViewItem::Error("That's not a valid number.".into())),
        }
    }
}

/// Equip granted items, then one weapon per slot. Single-option slots are auto-equipped.
///
/// # Errors
/// `UnknownContent` for a loadout referencing a missing weapon; `Quit` and input failures.
pub fn equip_loadout(
    player: &mut Player,
    loadout: &LoadoutDef,
    content: &Content,
    input: &mut dyn InputSource,
    view: &mut View,
) -> EngineResult<()> {
    view.push(ViewItem::EngineMessage(format!("Time to gear up, {}.", player.class_name)));
    for key in &loadout.granted {
        player.equip(content.weapon(key)?.clone());
    }

    for slot in &loadout.slots {
        let options = slot
            .choices
            .iter()
            .map(|key| content.weapon(key))
            .collect::<EngineResult<Vec<_>>>()?;
        let chosen = match options.as_slice() {
            [] => continue,
            [only] => *only,
            many => {
                let lines: Vec<WeaponLine> = many.iter().map(|w| WeaponLine::from_weapon(w)).collect();
                let prompt = format!("Enter a number (1-{}):", many.len());
                loop {
                    view.push(ViewItem::LoadoutMenu {
                        slot: slot.slot.label().to_string(),
                        options: lines.clone(),
                    });
                    let token = read_token(input, view, player, &prompt)?;
                    if let Some(idx) = menu_pick(&token, many.len()) {
                        break many[idx];
                    }
                    view.push(ViewItem::Error("That's not a valid number.".into()));
                }
            },
        };
        view.push(ViewItem::Equipped {
            name: chosen.name.clone(),
            desc: chosen.desc.clone(),
        });
        player.equip(chosen.clone());
    }
    view.push(ViewItem::EngineMessage("Loadout confirmed. Get to the front!".into()));
    Ok(())
}

/// Class menu and loadout. Returns the finished player.
///
/// # Errors
/// See [`choose_class`] and [`equip_loadout`].
pub fn create_player(
    base_name: &str,
    content: &Content,
    input: &mut dyn InputSource,
    view: &mut View,
) -> EngineResult<Player> {
    let placeholder = Player {
        name: base_name.to_string(),
        ..Player::default()
    };
    let class = choose_class(&content.classes, &placeholder, input, view)?;
    let mut player = Player::from_class(base_name, class);
    info!("class chosen: {} ({})", class.key, player.name);
    let loadout = content.loadout(&class.key)?;
    equip_loadout(&mut player, loadout, content, input, view)?;
    Ok(player)
}

/// Play one run from player creation to an ending.
///
/// # Errors
/// `Quit` when the player leaves early; any fatal content or input error.
pub fn run_game(
    base_name: &str,
    content: &Content,
    mut navigator: Navigator,
    input: &mut dyn InputSource,
    dice: &mut dyn Dice,
    view: &mut View,
) -> EngineResult<RunSummary> {
    view.push(ViewItem::Title {
        title: content.game.title.clone(),
        map_name: String::new(),
    });
    let mut player = create_player(base_name, content, input, view)?;
    player.show_stats(view);
    player.show_inventory(view);
    view.push(ViewItem::EngineMessage(
        "(Type 'stats' or 'inventory' at most prompts to check your status.)".into(),
    ));
    if !content.game.map_name.is_empty() {
        view.push(ViewItem::EngineMessage(format!("Loading map: {}...", content.game.map_name)));
    }
    if !content.game.intro.is_empty() {
        view.push(ViewItem::Intro(content.game.intro.clone()));
    }

    let ending = loop {
        match navigator.advance(&mut player, content, input, dice, view)? {
            Progress::Continue(key) => info!("now at '{key}'"),
            Progress::Finished(key) => break key,
        }
    };
    view.flush();

    let summary = RunSummary {
        player_name: player.name.clone(),
        class_key: player.class_key.clone(),
        ending,
        hp_left: player.current_hp(),
        steps: navigator.visited.len(),
    };
    info!("run finished: {summary:?}");
    Ok(summary)
}
