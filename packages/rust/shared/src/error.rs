//! Error types for docquery.
//!
//! Library crates use [`DocQueryError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Containment policy: per-URL failures (`Fetch`, `ContentNotFound`,
//! `DocumentTooLarge`) and per-tool-call failures (`ToolInvocation`) are
//! absorbed at their origin — a dropped document or an informative
//! tool-result message. Only `Config`, `SearchProvider` (after bounded
//! retries), and `Reasoning` propagate to the caller of `answer`.

use std::path::PathBuf;

/// Top-level error type for all docquery operations.
#[derive(Debug, thiserror::Error)]
pub enum DocQueryError {
    /// Configuration loading or validation error (fatal, pre-flight).
    #[error("config error: {message}")]
    Config { message: String },

    /// Per-URL fetch failure: timeout, transport error, or non-200 status.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The expected content container was absent from the page.
    /// A normal outcome for non-documentation pages, not a system error.
    #[error("no article content found at {url}")]
    ContentNotFound { url: String },

    /// Normalized content exceeded the size cap. The document is discarded
    /// whole — truncation would feed ambiguously cut-off text downstream.
    #[error("document from {url} too large ({size} chars, cap {cap})")]
    DocumentTooLarge { url: String, size: usize, cap: usize },

    /// Search provider failure after the bounded retry budget is exhausted.
    #[error("search provider error: {0}")]
    SearchProvider(String),

    /// A tool invocation from the reasoning capability could not be decoded
    /// or executed. Surfaced back to it as a tool-result, never fatal.
    #[error("tool invocation error: {0}")]
    ToolInvocation(String),

    /// Reasoning capability failure (auth, rate limit, outage). Fatal to the
    /// agent loop.
    #[error("reasoning error: {0}")]
    Reasoning(String),

    /// HTML parsing or markdown conversion error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocQueryError>;

impl DocQueryError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a per-URL fetch error.
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// Whether this failure is contained at its origin (dropped item or
    /// tool-result) rather than propagated to the top-level caller.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::ContentNotFound { .. }
                | Self::DocumentTooLarge { .. }
                | Self::ToolInvocation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocQueryError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = DocQueryError::fetch("https://example.com/x", "HTTP 404");
        assert!(err.to_string().contains("https://example.com/x"));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn too_large_reports_sizes() {
        let err = DocQueryError::DocumentTooLarge {
            url: "https://example.com/big".into(),
            size: 2_000_000,
            cap: 1_000_000,
        };
        assert!(err.to_string().contains("2000000"));
        assert!(err.to_string().contains("1000000"));
    }

    #[test]
    fn per_item_classification() {
        assert!(DocQueryError::fetch("u", "r").is_per_item());
        assert!(DocQueryError::ContentNotFound { url: "u".into() }.is_per_item());
        assert!(DocQueryError::ToolInvocation("bad args".into()).is_per_item());
        assert!(!DocQueryError::config("x").is_per_item());
        assert!(!DocQueryError::Reasoning("down".into()).is_per_item());
        assert!(!DocQueryError::SearchProvider("exhausted".into()).is_per_item());
    }
}
