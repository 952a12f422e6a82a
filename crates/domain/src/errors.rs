//! Error types used throughout the toolkit

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classes of failure, tagged on reported request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing identifiers, invalid role names, missing bearer token.
    Configuration,
    /// Network-level failure or HTTP 5xx.
    Transport,
    /// Sign-in could not resolve an identity provider.
    Authentication,
    /// A request failure escalated by strict mode.
    Application,
    /// Bugs and invariant violations.
    Internal,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::Authentication => "authentication",
            Self::Application => "application",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for apiseed
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SeedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SeedError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::InvalidInput(_) => ErrorCategory::Configuration,
            Self::Network(_) | Self::Server(_) => ErrorCategory::Transport,
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Request(_) => ErrorCategory::Application,
            Self::Serialization(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for apiseed operations
pub type Result<T> = std::result::Result<T, SeedError>;
