//! Error types for the projector crate

use thiserror::Error;

/// Errors that can occur while projecting a declaration
///
/// Only rule-table authoring problems are fatal. A declarative value that
/// cannot be resolved is normal control flow and never surfaces here.
#[derive(Error, Debug)]
pub enum Error {
    /// A nested rule referenced a command with no entry in the rule table
    #[error("no rule entry for command `{0}`")]
    UnknownCommand(String),

    /// A rule declares `requiredModules` without the mandatory `anyOf` list
    #[error("rule `{0}` declares requiredModules without anyOf")]
    MissingAnyOf(String),

    /// IO error while loading a rule table
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rule table is not valid JSON or does not match the rule schema
    #[error("invalid rule table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for projector operations
pub type Result<T> = std::result::Result<T, Error>;
