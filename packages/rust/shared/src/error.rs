//! Error types for Slidesmith.
//!
//! Library crates use [`SlidesmithError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Slidesmith operations.
#[derive(Debug, thiserror::Error)]
pub enum SlidesmithError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport or API failure talking to the language-model provider.
    /// Timeouts land here too.
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider account cannot serve requests (quota or rate limit exhausted).
    #[error("provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Model output could not be interpreted as the expected structure.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The caller abandoned the run.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SlidesmithError>;

impl SlidesmithError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the distinguished quota failure.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SlidesmithError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = SlidesmithError::parse("no JSON object in response");
        assert!(err.to_string().contains("no JSON object"));

        let err = SlidesmithError::QuotaExceeded("insufficient_quota".into());
        assert_eq!(err.to_string(), "provider quota exceeded: insufficient_quota");
    }

    #[test]
    fn quota_predicate() {
        assert!(SlidesmithError::QuotaExceeded("x".into()).is_quota_exceeded());
        assert!(!SlidesmithError::Provider("HTTP 500".into()).is_quota_exceeded());
        assert!(!SlidesmithError::Cancelled.is_quota_exceeded());
    }
}
