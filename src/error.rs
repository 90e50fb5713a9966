// src/error.rs

//! Unified error handling for the sync engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A remote API answered, but not with the expected status
    #[error("{service} returned an error: {message}")]
    Remote { service: String, message: String },

    /// Something the operator asked for does not exist
    #[error("Not found: {0}")]
    Lookup(String),

    /// Markup did not have the shape we rely on
    #[error("Parse error: {0}")]
    Parse(String),

    /// An assumption about upstream data or our own bookkeeping broke
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// An importable post could not be tied to a known child
    #[error("Match error for post {post_id}: {message}")]
    Match { post_id: u64, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a remote API error.
    pub fn remote(service: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Remote {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Create a lookup failure.
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup(message.into())
    }

    /// Create a markup parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Create a match error for a post.
    pub fn matching(post_id: u64, message: impl fmt::Display) -> Self {
        Self::Match {
            post_id,
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error means a logic bug or an upstream contract change
    /// rather than a problem with one post.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_) | Self::Parse(_))
    }
}
