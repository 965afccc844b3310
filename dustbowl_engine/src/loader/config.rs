//! Runtime settings loader.
//!
//! Settings come from `config.toml` in the data directory. The file is optional: if it
//! cannot be read or parsed, the defaults are used and a warning is logged. The
//! `DUSTBOWL_SEED` environment variable overrides the configured seed.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable that fixes the dice seed for a run.
pub const SEED_ENV_VAR: &str = "DUSTBOWL_SEED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Base name; the chosen class is appended ("New Merc the Scout").
    pub player_name: String,
    /// Fixed seed for reproducible runs. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Overrides the content file's start location.
    pub start_key: Option<String>,
    /// Content file, relative to the data directory.
    pub content_file: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_name: "New Merc".to_string(),
            seed: None,
            start_key: None,
            content_file: "content.ron".to_string(),
        }
    }
}

/// Load settings from `toml_path`, falling back to defaults on error, then apply the
/// environment seed override. Never fails.
pub fn load_config(toml_path: &Path) -> GameConfig {
    let config = match try_load_config(toml_path) {
        Ok(config) => {
            info!("settings loaded from '{}'", toml_path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load settings from '{}': {e:#}. Using defaults.",
                toml_path.display()
            );
            GameConfig::default()
        },
    };
    apply_seed_override(config, env::var(SEED_ENV_VAR).ok().as_deref())
}

/// Attempts to load settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
fn try_load_config(toml_path: &Path) -> Result<GameConfig> {
    let text =
        fs::read_to_string(toml_path).with_context(|| format!("reading settings from '{}'", toml_path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing settings from '{}'", toml_path.display()))
}

fn apply_seed_override(mut config: GameConfig, value: Option<&str>) -> GameConfig {
    if let Some(raw) = value {
        match raw.trim().parse::<u64>() {
            Ok(seed) => {
                info!("{SEED_ENV_VAR} overrides seed: {seed}");
                config.seed = Some(seed);
            },
            Err(e) => warn!("ignoring {SEED_ENV_VAR}='{raw}': {e}"),
        }
    }
    config
}
