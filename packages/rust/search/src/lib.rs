//! Query-to-URL discovery via an external search provider.
//!
//! Sends the user's query, scoped to the configured documentation domain,
//! to a JSON search endpoint and turns the hits into a deduplicated,
//! filtered candidate URL list for the retrieval engine.
//!
//! Provider failures are treated as transient and retried with bounded
//! exponential backoff; once the attempt budget is exhausted the error
//! surfaces as `SearchProvider`. The retry loop holds no resources between
//! attempts, so cancelling the caller cancels the sleep too.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use docquery_shared::{DocQueryError, Result, SearchConfig};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("docquery/", env!("CARGO_PKG_VERSION"));

/// Timeout for one search request.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Ceiling on a single backoff sleep.
const MAX_BACKOFF_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One search hit as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Provider response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// HTTP client for the external search provider.
pub struct SearchClient {
    client: Client,
    config: SearchConfig,
    api_key: String,
}

impl SearchClient {
    /// Create a search client. Reads the provider API key from the env var
    /// the config names — missing key fails fast before any network use.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let api_key = docquery_shared::resolve_api_key(&config.api_key_env)?;
        Self::with_api_key(config, api_key)
    }

    /// Create a search client with an explicit API key, bypassing env-var
    /// resolution.
    pub fn with_api_key(config: SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocQueryError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// Discover candidate documentation URLs for a free-text query.
    ///
    /// The query is restricted to the configured site domain; hits whose
    /// URL contains the exclusion marker are dropped, and the remainder is
    /// deduplicated preserving provider order.
    #[instrument(skip(self), fields(site = %self.config.site))]
    pub async fn discover(&self, query: &str) -> Result<Vec<Url>> {
        let scoped = format!("{query} site:{}", self.config.site);
        let hits = self.search_with_retry(&scoped).await?;

        let urls = filter_urls(&hits, &self.config.exclude_marker);

        info!(hits = hits.len(), urls = urls.len(), "discovery complete");
        Ok(urls)
    }

    /// Issue the search request, retrying transient failures with bounded
    /// exponential backoff.
    async fn search_with_retry(&self, scoped_query: &str) -> Result<Vec<SearchHit>> {
        let max_attempts = self.config.retry_max_attempts.max(1);
        let mut delay = Duration::from_secs(self.config.retry_base_delay_secs);

        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.search_once(scoped_query).await {
                Ok(hits) => return Ok(hits),
                Err(RequestError::Fatal(msg)) => {
                    return Err(DocQueryError::SearchProvider(msg));
                }
                Err(RequestError::Transient(msg)) => {
                    warn!(attempt, max_attempts, error = %msg, "search attempt failed");
                    last_error = msg;

                    if attempt < max_attempts {
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(Duration::from_secs(MAX_BACKOFF_SECS));
                    }
                }
            }
        }

        Err(DocQueryError::SearchProvider(format!(
            "exhausted {max_attempts} attempts: {last_error}"
        )))
    }

    /// One request against the provider endpoint.
    async fn search_once(
        &self,
        scoped_query: &str,
    ) -> std::result::Result<Vec<SearchHit>, RequestError> {
        debug!(query = %scoped_query, "querying search provider");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("q", scoped_query),
                ("count", &self.config.max_results.to_string()),
            ])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| RequestError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let msg = format!("HTTP {status}");
            // Rate limiting and server faults are transient; other client
            // errors (bad request, bad key) will not heal on retry.
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(RequestError::Transient(msg))
            } else {
                Err(RequestError::Fatal(msg))
            };
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RequestError::Transient(format!("malformed response: {e}")))?;

        Ok(parsed.results)
    }
}

/// Classified outcome of one provider request.
enum RequestError {
    /// Worth retrying: transport failure, 429, 5xx, undecodable body.
    Transient(String),
    /// Retry cannot help: 4xx other than rate limiting.
    Fatal(String),
}

/// Parse, filter, and deduplicate hit URLs preserving first occurrence.
fn filter_urls(hits: &[SearchHit], exclude_marker: &str) -> Vec<Url> {
    let mut seen = std::collections::HashSet::new();
    hits.iter()
        .filter(|h| exclude_marker.is_empty() || !h.url.contains(exclude_marker))
        .filter_map(|h| Url::parse(&h.url).ok())
        .filter(|u| seen.insert(u.as_str().to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
