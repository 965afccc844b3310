//! Engine error taxonomy.
//!
//! `InvalidChoice` and `EmptyInventorySlot` are recoverable: the caller re-issues the same
//! decision point. Everything else ends the run.
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("'{token}' is not a valid choice here")]
    InvalidChoice { token: String },

    #[error("no usable combat item in inventory")]
    EmptyInventorySlot,

    #[error("location '{from}' routes to unknown location '{to}'")]
    GraphIntegrity { from: String, to: String },

    #[error("unknown {kind} '{key}'")]
    UnknownContent { kind: &'static str, key: String },

    #[error("player quit")]
    Quit,

    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),
}

impl EngineError {
    /// Returns true if the error only invalidates the current decision, not the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InvalidChoice { .. } | EngineError::EmptyInventorySlot)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
