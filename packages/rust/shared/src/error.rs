//! Error types for screenlens.
//!
//! Library crates use [`ScreenlensError`] via `thiserror`.
//! The binary wraps this with `color-eyre`; the HTTP layer maps each variant
//! to a status code.

use std::path::PathBuf;

/// Top-level error type for all screenlens operations.
///
/// Provider and extraction failures never show up here: they are absorbed at
/// their own boundary and degrade to "no data".
#[derive(Debug, thiserror::Error)]
pub enum ScreenlensError {
    /// Missing credential or unreadable configuration.
    #[error("config error: {message}")]
    Config { message: String },

    /// Uploaded payload is not an image we can pass to the vision model.
    #[error("unsupported media: {message}")]
    UnsupportedMedia { message: String },

    /// Malformed client request (missing field, empty upload, ...).
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// Upload larger than the configured body limit.
    #[error("payload too large: {message}")]
    PayloadTooLarge { message: String },

    /// The vision model replied with something that is not the expected JSON.
    #[error("upstream format error: {message}")]
    UpstreamFormat { message: String },

    /// Transport or HTTP-status failure talking to the vision model.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration values.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScreenlensError>;

impl ScreenlensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an unsupported-media error.
    pub fn unsupported_media(msg: impl Into<String>) -> Self {
        Self::UnsupportedMedia {
            message: msg.into(),
        }
    }

    /// Create a bad-request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            message: msg.into(),
        }
    }

    /// Create a payload-too-large error.
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: msg.into(),
        }
    }

    /// Create an upstream format error.
    pub fn upstream_format(msg: impl Into<String>) -> Self {
        Self::UpstreamFormat {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ScreenlensError::config("OPENAI_API_KEY is not set on server");
        assert_eq!(
            err.to_string(),
            "config error: OPENAI_API_KEY is not set on server"
        );

        let err = ScreenlensError::upstream_format("expected JSON object");
        assert!(err.to_string().starts_with("upstream format error"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = ScreenlensError::io(
            "/tmp/missing.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        );
        assert!(err.to_string().contains("/tmp/missing.png"));
    }
}
