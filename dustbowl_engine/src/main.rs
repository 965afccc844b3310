#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Dustbowl **
//! TF2 text adventure on the encounter engine

use dustbowl_engine::data_paths::data_path;
use dustbowl_engine::navigator::Navigator;
use dustbowl_engine::style::GameStyle;
use dustbowl_engine::{EngineError, InputManager, RngDice, View, load_config, load_content, run_game};

use anyhow::{Context, Result};
use colored::Colorize;

use log::{error, info};

use std::io::Write;

fn main() -> Result<()> {
    env_logger::init();
    info!("Start: loading Dustbowl settings and content...");
    let config = load_config(&data_path("config.toml"));
    let content_path = data_path(&config.content_file);
    let (content, graph) = load_content(&content_path).context("while loading Dustbowl content")?;
    info!("content loaded from '{}'", content_path.display());

    let navigator = match config.start_key.as_deref() {
        Some(key) => Navigator::starting_at(graph, key),
        None => Navigator::new(graph),
    };
    let mut dice = match config.seed {
        Some(seed) => {
            info!("using fixed dice seed {seed}");
            RngDice::seeded(seed)
        },
        None => RngDice::from_os_rng(),
    };
    let mut input = InputManager::new();
    let mut view = View::new();

    // clear the screen
    print!("\x1B[2J\x1B[H");
    std::io::stdout().flush().context("while clearing the screen")?;
    info!("Starting the game!");

    match run_game(&config.player_name, &content, navigator, &mut input, &mut dice, &mut view) {
        Ok(summary) => {
            info!("game over: {summary:?}");
            Ok(())
        },
        Err(EngineError::Quit) => {
            view.flush();
            println!("\n{}", "See you on the battlefield, mercenary.".bright_yellow());
            Ok(())
        },
        Err(err) => {
            view.flush();
            error!("run aborted: {err}");
            println!("{}", format!("The run ended abruptly: {err}").error_style());
            Err(err).context("while running the game")
        },
    }
}
