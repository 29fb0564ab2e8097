//! Error types for SiteScout.
//!
//! Library crates use [`SiteScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The taxonomy mirrors how failures propagate: fetch and parse errors
//! are recovered per-URL and never abort a run; search-provider errors
//! exhaust one discovery method and fall through to the next; only
//! persistence failures are fatal for the current iteration.

use std::path::PathBuf;

/// Top-level error type for all SiteScout operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page (timeout, 4xx, 5xx).
    /// Recovered locally: the page is skipped and the crawl continues.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Malformed HTML or unextractable links. The page is treated as a
    /// leaf with zero outbound links.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// External search provider failure (quota, auth, malformed
    /// response). The current discovery method is marked exhausted.
    #[error("search provider error: {0}")]
    SearchProvider(String),

    /// Worklist file unreadable or unwritable. Fatal for the current
    /// iteration; previously persisted state is left untouched.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid seed URL, bad team id, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiteScoutError>;

impl SiteScoutError {
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

    /// True when the error is recoverable at the per-URL level.
    pub fn is_per_url(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SiteScoutError::config("missing search API key");
        assert_eq!(err.to_string(), "config error: missing search API key");

        let err = SiteScoutError::Fetch("https://example.com: HTTP 503".into());
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn per_url_classification() {
        assert!(SiteScoutError::Fetch("timeout".into()).is_per_url());
        assert!(SiteScoutError::parse("no links").is_per_url());
        assert!(!SiteScoutError::Persistence("disk full".into()).is_per_url());
    }
}
