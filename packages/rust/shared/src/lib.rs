//! Shared types, error model, and configuration for docquery.
//!
//! This crate is the foundation depended on by all other docquery crates.
//! It provides:
//! - [`DocQueryError`] — the unified error type
//! - Domain types ([`Document`], [`RunId`], the size cap)
//! - Configuration ([`AppConfig`], config loading, API-key resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentConfig, AppConfig, ReasoningConfig, RetrievalConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{DocQueryError, Result};
pub use types::{Document, MAX_DOCUMENT_CHARS, RunId};
