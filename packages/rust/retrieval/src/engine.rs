//! Bounded-concurrency retrieval over a URL set.
//!
//! Fans out fetch + normalize units over a semaphore-bounded worker pool,
//! collecting the documents that survived. Partial failure is the steady
//! state: one URL's timeout, bad status, or missing article never affects
//! another URL's processing.

use std::collections::HashSet;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

use docquery_shared::{Document, Result, RetrievalConfig};

use crate::fetch;

// ---------------------------------------------------------------------------
// BatchResult
// ---------------------------------------------------------------------------

/// Summary of one retrieval batch.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Documents that were fetched and normalized successfully.
    /// Membership is independent of completion order.
    pub documents: Vec<Document>,
    /// Distinct URLs attempted after dedup.
    pub attempted: usize,
    /// URLs that produced a document.
    pub succeeded: usize,
    /// Per-URL failures (URL, cause). Informational only.
    pub errors: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// RetrievalEngine
// ---------------------------------------------------------------------------

/// Concurrent fetch-and-normalize engine with a bounded worker pool.
///
/// Holds one pooled HTTP client shared read-only across all workers.
/// Dropping the future returned by [`retrieve`](Self::retrieve) aborts
/// in-flight units without leaking tasks (cancellation path for caller
/// timeouts and shutdown).
pub struct RetrievalEngine {
    client: Client,
    concurrency: usize,
}

impl RetrievalEngine {
    /// Create an engine from retrieval configuration.
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let client = fetch::build_client(config.timeout_secs)?;
        Ok(Self {
            client,
            concurrency: config.concurrency.max(1) as usize,
        })
    }

    /// Create an engine with an existing client (shared across subsystems).
    pub fn with_client(client: Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch and normalize every distinct URL in `urls`, with at most
    /// `concurrency` fetches in flight at any time.
    ///
    /// Blocks until all units have completed. Never fails as a whole —
    /// per-URL failures are logged and reported in [`BatchResult::errors`].
    #[instrument(skip_all, fields(urls = urls.len(), limit = self.concurrency))]
    pub async fn retrieve(&self, urls: &[Url]) -> BatchResult {
        let distinct = dedup_urls(urls);
        let attempted = distinct.len();

        if distinct.is_empty() {
            return BatchResult::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<(String, Result<Document>)> = JoinSet::new();

        for url in distinct {
            let client = self.client.clone();
            let sem = semaphore.clone();

            join_set.spawn(async move {
                // Closed only when the JoinSet is dropped, which also
                // aborts this task before it can observe the error.
                let _permit = sem.acquire().await.expect("semaphore closed");

                let outcome = fetch_one(&client, &url).await;
                (url.to_string(), outcome)
            });
        }

        let mut result = BatchResult {
            attempted,
            ..Default::default()
        };

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((url, Ok(doc))) => {
                    debug!(%url, chars = doc.content.len(), "document retrieved");
                    result.succeeded += 1;
                    result.documents.push(doc);
                }
                Ok((url, Err(e))) => {
                    warn!(%url, error = %e, "dropping URL from batch");
                    result.errors.push((url, e.to_string()));
                }
                Err(e) => {
                    warn!(error = %e, "retrieval task panicked");
                    result.errors.push(("task".into(), e.to_string()));
                }
            }
        }

        info!(
            attempted = result.attempted,
            succeeded = result.succeeded,
            errors = result.errors.len(),
            "retrieval batch complete"
        );

        result
    }

    /// Fetch and normalize a single URL.
    ///
    /// Unlike [`retrieve`](Self::retrieve), the failure is surfaced to the
    /// caller — used by the page-fetch tool, where the reasoning step wants
    /// to know why a specific URL produced nothing.
    pub async fn retrieve_one(&self, url: &Url) -> Result<Document> {
        fetch_one(&self.client, url).await
    }
}

/// One unit of work: fetch a page and normalize it into a document.
async fn fetch_one(client: &Client, url: &Url) -> Result<Document> {
    let html = fetch::fetch_page(client, url).await?;
    docquery_markdown::normalize(&html, url.as_str())
}

/// Deduplicate URLs preserving first-occurrence order.
///
/// Order affects scheduling only, never the resulting document set.
pub fn dedup_urls(urls: &[Url]) -> Vec<Url> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|u| seen.insert(u.as_str().to_string()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn article(body: &str) -> String {
        format!("<html><body><article><h1>Page</h1><p>{body}</p></article></body></html>")
    }

    fn engine(concurrency: u32, timeout_secs: u64) -> RetrievalEngine {
        RetrievalEngine::new(&RetrievalConfig {
            concurrency,
            timeout_secs,
        })
        .unwrap()
    }

    async fn mount_page(server: &wiremock::MockServer, path: &str, body: &str) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn dedup_preserves_first_occurrence() {
        let a = Url::parse("https://example.com/a").unwrap();
        let b = Url::parse("https://example.com/b").unwrap();
        let urls = vec![a.clone(), b.clone(), a.clone(), b.clone(), a.clone()];
        assert_eq!(dedup_urls(&urls), vec![a, b]);
    }

    #[tokio::test]
    async fn retrieve_collects_all_successes() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/one", &article("first page")).await;
        mount_page(&server, "/two", &article("second page")).await;
        mount_page(&server, "/three", &article("third page")).await;

        let urls: Vec<Url> = ["/one", "/two", "/three"]
            .iter()
            .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
            .collect();

        let result = engine(4, 10).retrieve(&urls).await;

        assert_eq!(result.attempted, 3);
        assert_eq!(result.succeeded, 3);
        assert!(result.errors.is_empty());

        let mut sources: Vec<&str> = result.documents.iter().map(|d| d.source_url.as_str()).collect();
        sources.sort();
        assert_eq!(sources.len(), 3);
        assert!(sources[0].ends_with("/one"));
    }

    #[tokio::test]
    async fn retrieve_drops_failures_without_sinking_batch() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/good", &article("survives")).await;
        wiremock::Mock::given(wiremock::matchers::path("/http500"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;
        // A page with no <article> container
        mount_page(&server, "/noarticle", "<html><body><p>landing</p></body></html>").await;

        let urls: Vec<Url> = ["/good", "/http500", "/noarticle"]
            .iter()
            .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
            .collect();

        let result = engine(4, 10).retrieve(&urls).await;

        assert_eq!(result.attempted, 3);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.documents.len(), 1);
        assert!(result.documents[0].content.contains("survives"));
    }

    #[tokio::test]
    async fn retrieve_timeout_excludes_only_that_url() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/fast", &article("quick")).await;
        wiremock::Mock::given(wiremock::matchers::path("/stall"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_string(article("late")),
            )
            .mount(&server)
            .await;

        let urls: Vec<Url> = ["/fast", "/stall"]
            .iter()
            .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
            .collect();

        let result = engine(4, 1).retrieve(&urls).await;

        assert_eq!(result.succeeded, 1);
        assert!(result.documents[0].source_url.ends_with("/fast"));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].0.ends_with("/stall"));
    }

    #[tokio::test]
    async fn retrieve_dedups_before_fanout() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/once"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(article("single")))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/once", server.uri())).unwrap();
        let urls = vec![url.clone(), url.clone(), url];

        let result = engine(4, 10).retrieve(&urls).await;
        assert_eq!(result.attempted, 1);
        assert_eq!(result.documents.len(), 1);
        // MockServer::expect(1) verifies on drop that exactly one request arrived.
    }

    #[tokio::test]
    async fn retrieve_respects_concurrency_limit() {
        let server = wiremock::MockServer::start().await;
        let delay = Duration::from_millis(100);
        for p in ["/p1", "/p2", "/p3", "/p4", "/p5", "/p6"] {
            wiremock::Mock::given(wiremock::matchers::path(p))
                .respond_with(
                    wiremock::ResponseTemplate::new(200)
                        .set_delay(delay)
                        .set_body_string(article(p)),
                )
                .mount(&server)
                .await;
        }

        let urls: Vec<Url> = ["/p1", "/p2", "/p3", "/p4", "/p5", "/p6"]
            .iter()
            .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
            .collect();

        // Limit 2 over 6 URLs of 100ms each: at least 3 sequential waves.
        let start = Instant::now();
        let result = engine(2, 10).retrieve(&urls).await;
        let elapsed = start.elapsed();

        assert_eq!(result.succeeded, 6);
        assert!(
            elapsed >= Duration::from_millis(250),
            "batch finished in {elapsed:?}; limit not enforced"
        );
    }

    #[tokio::test]
    async fn retrieve_membership_stable_across_runs() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/a", &article("alpha")).await;
        mount_page(&server, "/b", &article("beta")).await;
        mount_page(&server, "/c", &article("gamma")).await;

        let urls: Vec<Url> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
            .collect();

        let eng = engine(1, 10);
        let serial = eng.retrieve(&urls).await;
        let eng = engine(3, 10);
        let parallel = eng.retrieve(&urls).await;

        let mut serial_sources: Vec<String> =
            serial.documents.iter().map(|d| d.source_url.clone()).collect();
        let mut parallel_sources: Vec<String> =
            parallel.documents.iter().map(|d| d.source_url.clone()).collect();
        serial_sources.sort();
        parallel_sources.sort();
        assert_eq!(serial_sources, parallel_sources);
    }

    #[tokio::test]
    async fn retrieve_empty_url_set() {
        let result = engine(4, 10).retrieve(&[]).await;
        assert_eq!(result.attempted, 0);
        assert!(result.documents.is_empty());
    }
}
