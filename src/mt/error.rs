//! Error types for translation providers

use thiserror::Error;

/// Errors raised by a [`TranslationService`](crate::mt::TranslationService) implementation
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Provider is misconfigured (missing API key, rejected credentials, bad locale)
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure talking to the provider
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered, but the answer was unusable
    #[error("translation error: {0}")]
    Translation(String),

    /// A requested key has no counterpart in the provider's result
    #[error("translation result is missing requested key '{key}'")]
    IncompleteResult { key: String },

    /// Local I/O failure (manual provider prompts)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for provider operations
pub type ServiceResult<T> = Result<T, ServiceError>;
