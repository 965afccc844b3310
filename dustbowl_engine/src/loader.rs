//! Loader utilities for building the runtime tables from serialized data.
//!
//! Content is loaded from `content.ron` (RON) and validated as a whole; runtime settings
//! stay TOML-backed (see [`config`]).

pub mod config;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use dustbowl_data::ContentDef;
use log::info;

use crate::content::Content;
use crate::navigator::StoryGraph;

/// Load a `ContentDef` from a RON file.
///
/// # Errors
/// Fails if the file cannot be read or parsed.
pub fn load_content_def(path: &Path) -> Result<ContentDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading content from '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing content RON from '{}'", path.display()))
}

/// Load, validate, and split the content file into lookup tables and the story graph.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or validation.
pub fn load_content(path: &Path) -> Result<(Content, StoryGraph)> {
    let def = load_content_def(path)?;
    validate_content_def(&def)?;
    info!("{} classes loaded", def.classes.len());
    info!("{} weapons loaded", def.weapons.len());
    info!("{} enemies loaded", def.enemies.len());
    info!("{} locations loaded", def.locations.len());
    info!("{} class edges loaded", def.class_edges.len());
    Ok(Content::build(def))
}

/// Validate the content and return a single aggregated error.
fn validate_content_def(def: &ContentDef) -> Result<()> {
    let errors = dustbowl_data::validate_content(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("content validation failed:\n{details}");
}
