// src/error.rs

//! Unified error handling for the quote session core.

use std::fmt;

use thiserror::Error;

/// Result type alias for session operations.
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

    /// At least one of the concurrent provider fetches failed
    #[error("Failed to fetch quote batch ({failed} of {requested} requests failed): {message}")]
    FetchFailure {
        requested: usize,
        failed: usize,
        message: String,
    },

    /// A refetch is already pending
    #[error("A batch refetch is already in progress")]
    RefetchInProgress,

    /// Provider returned a record that is not a usable quote
    #[error("Invalid quote from provider: {0}")]
    InvalidQuote(String),

    /// Operation requires a non-empty batch
    #[error("Quote batch is empty")]
    EmptyBatch,

    /// Favorites index outside the current list
    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Carousel index outside the current match list
    #[error("Invalid carousel index {index} for {len} matches")]
    InvalidIndex { index: usize, len: usize },

    /// Carousel navigation requested while the carousel is closed
    #[error("Carousel is not open")]
    NotOpen,

    /// No clipboard capability on this platform
    #[error("Clipboard is not available")]
    ClipboardUnavailable,

    /// No native share capability on this platform
    #[error("Native share is not supported on this device")]
    ShareUnavailable,

    /// A platform capability failed while running
    #[error("{capability} failed: {message}")]
    Capability {
        capability: &'static str,
        message: String,
    },

    /// Storage key or backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a batch fetch failure.
    pub fn fetch_failure(requested: usize, failed: usize, message: impl fmt::Display) -> Self {
        Self::FetchFailure {
            requested,
            failed,
            message: message.to_string(),
        }
    }

    /// Create a capability failure.
    pub fn capability(capability: &'static str, message: impl fmt::Display) -> Self {
        Self::Capability {
            capability,
            message: message.to_string(),
        }
    }

    /// Create an invalid quote error.
    pub fn invalid_quote(message: impl Into<String>) -> Self {
        Self::InvalidQuote(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from a precondition the caller should have guarded.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyBatch | Self::IndexOutOfRange { .. } | Self::InvalidIndex { .. } | Self::NotOpen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_message() {
        let err = AppError::fetch_failure(40, 2, "timeout");
        assert_eq!(
            err.to_string(),
            "Failed to fetch quote batch (2 of 40 requests failed): timeout"
        );
    }

    #[test]
    fn test_precondition_classification() {
        assert!(AppError::EmptyBatch.is_precondition());
        assert!(AppError::IndexOutOfRange { index: 3, len: 1 }.is_precondition());
        assert!(!AppError::ClipboardUnavailable.is_precondition());
        assert!(!AppError::RefetchInProgress.is_precondition());
    }
}
