//! Error type definitions for the KS broker
//!
//! Provides a small hierarchical error system: a top-level `AppError` for
//! the token issuance service and web layer, and a `PlayerError` enum for
//! the player lifecycle controller.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input rejected at the boundary, before any network call
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Missing or invalid account settings; operator-fixable
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Provider unreachable, or returned a malformed or empty response
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Transport errors from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Player lifecycle errors
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Player lifecycle controller specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The vendor player script never became available within the timeout
    #[error("Player script unavailable after {waited_ms}ms")]
    ScriptUnavailable { waited_ms: u64 },

    /// The session token could not be obtained
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Player construction or media load failed
    #[error("Player initialization failed: {message}")]
    Init { message: String },

    /// Player teardown failed; logged, never propagated
    #[error("Player teardown failed: {message}")]
    Teardown { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error for a named field
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl PlayerError {
    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an initialization error
    pub fn init<S: Into<String>>(message: S) -> Self {
        Self::Init {
            message: message.into(),
        }
    }

    /// Create a teardown error
    pub fn teardown<S: Into<String>>(message: S) -> Self {
        Self::Teardown {
            message: message.into(),
        }
    }
}
