// src/error.rs

//! Unified error handling for the bulletin watcher.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
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

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The bulletin could not be retrieved
    #[error("Fetch error for {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// The bulletin no longer matches the expected layout
    #[error("Malformed bulletin: {0}")]
    MalformedBulletin(String),

    /// The watermark tracker could not be read or written
    #[error("Watermark store error at {}: {source}", path.display())]
    Watermark {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The previous watermark no longer appears in the bulletin
    #[error("Delta boundary unresolved: {watermark} not found in the current bulletin")]
    DeltaBoundaryUnresolved { watermark: String },

    /// The notification could not be handed to the transport
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error with the source it came from.
    pub fn fetch(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed bulletin error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBulletin(message.into())
    }

    /// Wrap an I/O failure on the watermark tracker.
    pub fn watermark(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Watermark {
            path: path.into(),
            source,
        }
    }
}

/// Failures while building or delivering a notification.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Nothing to send
    #[error("refusing to send an empty notification")]
    EmptyMessage,

    /// Sender or recipient address rejected
    #[error("invalid {field} address '{address}': {message}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        message: String,
    },

    /// Message could not be assembled
    #[error("failed to build message: {0}")]
    Build(String),

    /// Connection, TLS negotiation or authentication failed
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DispatchError {
    /// Create an invalid address error.
    pub fn address(field: &'static str, address: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidAddress {
            field,
            address: address.into(),
            message: message.to_string(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }
}
