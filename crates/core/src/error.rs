//! Error types for the Agri-Climate Assistant.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, language model, dataset catalog,
//! prompt and serialization errors.

use thiserror::Error;

/// Unified error type for the Agri-Climate Assistant.
///
/// External calls return `Result<T, AppError>`. The question pipeline catches
/// these at each call site and degrades instead of propagating them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, unknown provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Open-data catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
