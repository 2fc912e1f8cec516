//! Single-URL page fetching with timeout and failure containment.
//!
//! A fetch either returns the response body of an HTTP 200 or a
//! `Fetch` error carrying the URL and cause — nothing escapes past this
//! boundary. Retry policy is deliberately absent: the retrieval engine
//! treats a single miss as acceptable (best-effort corpus).

use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use docquery_shared::{DocQueryError, Result};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("docquery/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

/// Build the pooled HTTP client shared by all fetch workers in a batch.
///
/// The client is used concurrently and never mutated; one per
/// [`RetrievalEngine`](crate::RetrievalEngine).
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocQueryError::config(format!("failed to build HTTP client: {e}")))
}

/// Perform a single GET for `url`.
///
/// Success is strictly HTTP 200. Any other status, transport error, or
/// timeout becomes a `Fetch` error.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    debug!(%url, "fetching page");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| DocQueryError::fetch(url.as_str(), e.to_string()))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(DocQueryError::fetch(
            url.as_str(),
            format!("HTTP {status}"),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| DocQueryError::fetch(url.as_str(), format!("body read failed: {e}")))
}
