#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const DUSTBOWL_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod combat;
pub mod content;
pub mod data_paths;
pub mod dice;
pub mod enemy;
pub mod error;
pub mod game;
pub mod health;
pub mod input;
pub mod loader;
pub mod navigator;
pub mod player;
pub mod style;
pub mod view;

// Re-exports for convenience
pub use combat::{Combat, Outcome};
pub use content::Content;
pub use dice::{Dice, RngDice, ScriptedDice};
pub use enemy::Enemy;
pub use error::{EngineError, EngineResult};
pub use game::{RunSummary, run_game};
pub use input::{InputManager, InputSource, ScriptedInput};
pub use loader::config::{GameConfig, load_config};
pub use loader::load_content;
pub use navigator::{Navigator, StoryGraph};
pub use player::Player;
pub use view::View;
