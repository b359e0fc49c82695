//! Error types for the service SDK

use std::io;

use thiserror::Error;

/// Result type alias for the service SDK
pub type Result<T> = std::result::Result<T, Error>;

/// Service SDK errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry client could not be built or the registry query failed
    #[error("Registry error: {0}")]
    Registry(String),

    /// Transport error (network failure, timeout, or retry budget exhausted)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    /// Response body is not a well-formed envelope
    #[error("Decode error: {0}")]
    Decode(String),

    /// Registry returned no instances for the service
    #[error("No instances registered for service '{0}'")]
    NoInstances(String),

    /// Every registered instance failed
    #[error("All {attempts} instance(s) of service '{service}' failed")]
    AllInstancesFailed {
        /// Service name
        service: String,
        /// Number of instances tried
        attempts: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether a failed transport attempt may be retried against the same instance
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http(_) | Self::Io(_))
    }
}
