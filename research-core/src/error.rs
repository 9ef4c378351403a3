//! Error types for research-core.

use thiserror::Error;

/// Result type alias using research-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a research session.
///
/// Running out of time budget is not an error; it ends the loop and is
/// reported as a [`TerminationReason`](crate::TerminationReason).
#[derive(Error, Debug)]
pub enum Error {
    /// Search or reasoning backend failure
    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    /// Reasoning output was not well-formed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document hand-off failed after synthesis
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a provider error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error came from a search or reasoning backend.
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}
