//! Error types for the rules engine
//!
//! Illegal player intent is not an error: dispatch logs it and returns
//! `ActionOutcome::Rejected`. The variants here are reserved for caller
//! contract violations and infrastructure failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtgError {
    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    /// The engine was driven in a way that should be impossible through
    /// the decision interface (e.g. completing a cast that is not open).
    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Game cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl From<serde_json::Error> for MtgError {
    fn from(err: serde_json::Error) -> Self {
        MtgError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MtgError>;
