//! Shared content model for Dustbowl.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{FIGHT_TOKEN, RESERVED_TOKENS, ValidationError, validate_content};
