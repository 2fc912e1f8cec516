//! Concurrent web-content retrieval: single-URL fetching and the
//! bounded-concurrency batch engine.
//!
//! This crate provides:
//! - [`fetch`] — one GET with timeout and strict-200 success, failures
//!   contained at the boundary
//! - [`engine`] — semaphore-bounded fan-out producing a deduplicated
//!   [`Document`](docquery_shared::Document) set

pub mod engine;
pub mod fetch;

pub use engine::{BatchResult, RetrievalEngine, dedup_urls};
pub use fetch::{build_client, fetch_page};
