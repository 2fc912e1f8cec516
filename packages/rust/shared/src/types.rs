//! Core domain types for docquery retrieval and answering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters a normalized document may carry.
///
/// Documents over the cap are discarded whole, never truncated.
pub const MAX_DOCUMENT_CHARS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one agent-loop run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A normalized, size-bounded text extraction from one source URL.
///
/// Created by the retrieval engine after a successful fetch + normalize;
/// immutable thereafter. `source_url` is the dedup key within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Normalized page body (markdown).
    pub content: String,
    /// Origin URL the content was extracted from.
    pub source_url: String,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    /// Build a document, enforcing the size cap.
    ///
    /// Returns `None` when `content` exceeds [`MAX_DOCUMENT_CHARS`] —
    /// the caller maps that to a `DocumentTooLarge` error with context.
    pub fn new(content: String, source_url: impl Into<String>) -> Option<Self> {
        if content.chars().count() > MAX_DOCUMENT_CHARS {
            return None;
        }
        Some(Self {
            content,
            source_url: source_url.into(),
            fetched_at: Utc::now(),
        })
    }
}
