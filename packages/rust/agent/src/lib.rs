//! Tool-augmented answering over retrieved documentation.
//!
//! This crate wires the search and retrieval layers into a reasoning loop:
//! - [`conversation`] — the append-only transcript handed to the backend
//! - [`reasoning`] — the backend seam and the chat-completions client
//! - [`tools`] — the closed tool surface and its runtime
//! - [`runner`] — the loop that drives a question to an answer

pub mod conversation;
pub mod reasoning;
pub mod runner;
pub mod tools;

pub use conversation::{ConversationState, Message, Role, ToolCallRequest};
pub use reasoning::{ChatBackend, ReasoningBackend};
pub use runner::Agent;
pub use tools::{ToolInvocation, ToolRuntime, ToolSpec, tool_specs};

use docquery_shared::{AppConfig, Result};
use docquery_retrieval::RetrievalEngine;
use docquery_search::SearchClient;

/// Answer one question with everything assembled from config.
///
/// Both API keys are resolved up front so a missing key fails before any
/// network use.
pub async fn answer(config: &AppConfig, query: &str) -> Result<String> {
    let backend = ChatBackend::new(config.reasoning.clone())?;
    let search = SearchClient::new(config.search.clone())?;
    let engine = RetrievalEngine::new(&config.retrieval)?;

    Agent::new(backend, ToolRuntime::new(search, engine), config.agent.clone())
        .answer(query)
        .await
}
