//! Error types for zeroner.

use thiserror::Error;

/// Result type for zeroner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for zeroner operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error raised by the core data model (e.g. an unresolvable span record).
    #[error(transparent)]
    Core(#[from] zeroner_core::Error),

    /// Invalid input provided (caller contract violation).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Evaluation error.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A backend failed while predicting.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Error::Inference(msg.into())
    }
}
