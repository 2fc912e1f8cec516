//! The closed set of tools the reasoning backend may invoke.
//!
//! Tool calls arrive from the backend as a name plus a JSON argument blob.
//! Decoding goes through [`ToolInvocation`], a closed enum — an unknown name
//! or malformed arguments is rejected before anything touches the network.

use docquery_shared::{Document, DocQueryError, Result};
use docquery_retrieval::RetrievalEngine;
use docquery_search::SearchClient;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};
use url::Url;

// ---------------------------------------------------------------------------
// Tool specs
// ---------------------------------------------------------------------------

pub const SEARCH_DOCS: &str = "search_docs";
pub const FETCH_PAGE: &str = "fetch_page";

/// Declaration of a tool as advertised to the reasoning backend.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON schema for the tool's arguments.
    pub parameters: Value,
    /// What the tool hands back, appended to the advertised description.
    pub returns: &'static str,
}

impl ToolSpec {
    /// Description plus the return contract, as one advertised string.
    pub fn advertised_description(&self) -> String {
        format!("{} Returns: {}", self.description, self.returns)
    }
}

/// The full tool surface, in the order it is advertised.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: SEARCH_DOCS,
            description: "Search the documentation site for pages relevant to a query.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free-text search query"
                    }
                },
                "required": ["query"]
            }),
            returns: "the matching pages as markdown, each under a '## Source: <url>' header.",
        },
        ToolSpec {
            name: FETCH_PAGE,
            description: "Fetch a single documentation page by URL.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Absolute URL of the page to fetch"
                    }
                },
                "required": ["url"]
            }),
            returns: "the page content as markdown under a '## Source: <url>' header.",
        },
    ]
}

// ---------------------------------------------------------------------------
// Invocation decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    url: String,
}

/// A validated tool call, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    SearchDocs { query: String },
    FetchPage { url: Url },
}

impl ToolInvocation {
    /// Decode a backend tool call into a typed invocation.
    pub fn decode(name: &str, arguments: &Value) -> Result<Self> {
        match name {
            SEARCH_DOCS => {
                let args: SearchArgs = serde_json::from_value(arguments.clone())
                    .map_err(|e| bad_args(SEARCH_DOCS, &e))?;
                Ok(Self::SearchDocs { query: args.query })
            }
            FETCH_PAGE => {
                let args: FetchArgs = serde_json::from_value(arguments.clone())
                    .map_err(|e| bad_args(FETCH_PAGE, &e))?;
                let url = Url::parse(&args.url).map_err(|e| {
                    DocQueryError::ToolInvocation(format!(
                        "{FETCH_PAGE}: argument 'url' is not a valid URL: {e}"
                    ))
                })?;
                Ok(Self::FetchPage { url })
            }
            other => Err(DocQueryError::ToolInvocation(format!(
                "unknown tool '{other}'"
            ))),
        }
    }
}

fn bad_args(tool: &str, err: &serde_json::Error) -> DocQueryError {
    DocQueryError::ToolInvocation(format!("{tool}: invalid arguments: {err}"))
}

// ---------------------------------------------------------------------------
// ToolRuntime
// ---------------------------------------------------------------------------

/// Executes validated tool invocations against the search and retrieval
/// layers and renders the outcome as text for the transcript.
pub struct ToolRuntime {
    search: SearchClient,
    engine: RetrievalEngine,
}

impl ToolRuntime {
    pub fn new(search: SearchClient, engine: RetrievalEngine) -> Self {
        Self { search, engine }
    }

    /// Run one invocation to completion. Errors here are per-call: the
    /// caller folds them into the transcript rather than ending the run.
    #[instrument(skip(self))]
    pub async fn run(&self, invocation: ToolInvocation) -> Result<String> {
        match invocation {
            ToolInvocation::SearchDocs { query } => self.search_docs(&query).await,
            ToolInvocation::FetchPage { url } => self.fetch_page(&url).await,
        }
    }

    async fn search_docs(&self, query: &str) -> Result<String> {
        let urls = self.search.discover(query).await?;
        if urls.is_empty() {
            return Ok("No documentation pages matched the query.".to_string());
        }

        let batch = self.engine.retrieve(&urls).await;
        for (url, reason) in &batch.errors {
            warn!(%url, %reason, "page dropped from search results");
        }
        info!(
            attempted = batch.attempted,
            succeeded = batch.succeeded,
            "search_docs complete"
        );

        if batch.documents.is_empty() {
            return Ok(
                "Search found matching pages but none could be retrieved.".to_string(),
            );
        }
        Ok(render_documents(&batch.documents))
    }

    async fn fetch_page(&self, url: &Url) -> Result<String> {
        let document = self.engine.retrieve_one(url).await?;
        Ok(render_documents(std::slice::from_ref(&document)))
    }
}

/// Render documents with source attribution so the reasoning step can cite
/// where each passage came from.
fn render_documents(documents: &[Document]) -> String {
    let mut out = String::new();
    for document in documents {
        out.push_str("## Source: ");
        out.push_str(&document.source_url);
        out.push_str("\n\n");
        out.push_str(&document.content);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
