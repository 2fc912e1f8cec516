//! HTML-to-Markdown normalization for fetched documentation pages.
//!
//! Locates the primary content container (the first `<article>` element),
//! strips image elements, converts the remaining markup to clean Markdown
//! via the `htmd` crate, and enforces the document size cap.
//!
//! Pure functions throughout — no I/O, no shared state. Normalizing the
//! same HTML twice yields identical output (modulo the caller-supplied
//! fetch timestamp on the resulting [`Document`]).

mod cleanup;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use docquery_shared::{DocQueryError, Document, MAX_DOCUMENT_CHARS, Result};

/// Normalize raw HTML into a size-bounded markdown [`Document`].
///
/// Fails with:
/// - `ContentNotFound` when the page has no `<article>` element — the
///   expected outcome for landing pages, search pages, and other
///   non-documentation content.
/// - `DocumentTooLarge` when the converted markdown exceeds the cap; the
///   content is discarded whole, never emitted partially.
#[instrument(skip(html), fields(url = %source_url))]
pub fn normalize(html: &str, source_url: &str) -> Result<Document> {
    let article_html = extract_article(html).ok_or_else(|| DocQueryError::ContentNotFound {
        url: source_url.to_string(),
    })?;

    let markdown = to_markdown(&article_html)?;
    let cleaned = cleanup::run_pipeline(&markdown);

    debug!(raw_len = article_html.len(), md_len = cleaned.len(), "conversion complete");

    let size = cleaned.chars().count();
    Document::new(cleaned, source_url).ok_or_else(|| DocQueryError::DocumentTooLarge {
        url: source_url.to_string(),
        size,
        cap: MAX_DOCUMENT_CHARS,
    })
}

/// Extract the first `<article>` element's inner HTML.
///
/// Image elements are not removed here; [`to_markdown`] skips `img` and
/// `picture` tags during conversion, which drops them from the output
/// entirely.
fn extract_article(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let article_sel = Selector::parse("article").expect("valid selector");
    doc.select(&article_sel).next().map(|el| el.inner_html())
}

/// Convert content HTML to markdown, skipping non-content tags.
fn to_markdown(content_html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec![
            "img", "picture", "script", "style", "nav", "iframe", "noscript", "svg",
        ])
        .build();

    converter
        .convert(content_html)
        .map_err(|e| DocQueryError::parse(format!("htmd conversion failed: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://docs.example.com/guide/intro";

    fn page(body: &str) -> String {
        format!("<html><body><nav><a href=\"/\">Home</a></nav>{body}<footer>Copyright</footer></body></html>")
    }

    #[test]
    fn normalize_simple_article() {
        let html = page("<article><h1>Intro</h1><p>LangChain is a framework.</p></article>");
        let doc = normalize(&html, URL).unwrap();

        assert!(doc.content.contains("# Intro"));
        assert!(doc.content.contains("LangChain is a framework."));
        assert_eq!(doc.source_url, URL);
    }

    #[test]
    fn normalize_missing_article_is_content_not_found() {
        let html = page("<main><h1>Not an article</h1><p>Body text.</p></main>");
        let err = normalize(&html, URL).unwrap_err();
        assert!(matches!(err, DocQueryError::ContentNotFound { .. }));
    }

    #[test]
    fn normalize_strips_images() {
        let html = page(
            "<article><h1>Pics</h1><img src=\"/big-diagram.png\" alt=\"diagram\"><p>Caption text.</p></article>",
        );
        let doc = normalize(&html, URL).unwrap();
        assert!(doc.content.contains("Caption text."));
        assert!(!doc.content.contains("big-diagram.png"));
        assert!(!doc.content.contains("!["));
    }

    #[test]
    fn normalize_ignores_chrome_outside_article() {
        let html = page("<article><h1>Guide</h1><p>Important.</p></article>");
        let doc = normalize(&html, URL).unwrap();
        assert!(!doc.content.contains("Copyright"));
        assert!(!doc.content.contains("Home"));
    }

    #[test]
    fn normalize_over_cap_discards_whole() {
        // A paragraph large enough that the markdown exceeds the cap.
        let big = "word ".repeat(MAX_DOCUMENT_CHARS / 4);
        let html = page(&format!("<article><h1>Big</h1><p>{big}</p></article>"));
        let err = normalize(&html, URL).unwrap_err();
        match err {
            DocQueryError::DocumentTooLarge { url, size, cap } => {
                assert_eq!(url, URL);
                assert!(size > cap);
                assert_eq!(cap, MAX_DOCUMENT_CHARS);
            }
            other => panic!("expected DocumentTooLarge, got {other}"),
        }
    }

    #[test]
    fn normalize_is_deterministic() {
        let html = page("<article><h1>Same</h1><p>Input, same output.</p></article>");
        let a = normalize(&html, URL).unwrap();
        let b = normalize(&html, URL).unwrap();
        assert_eq!(a.content, b.content);
    }

    #[test]
    fn normalize_picks_first_article() {
        let html = page(
            "<article><h1>First</h1><p>Primary.</p></article><article><h1>Second</h1></article>",
        );
        let doc = normalize(&html, URL).unwrap();
        assert!(doc.content.contains("Primary."));
        assert!(!doc.content.contains("Second"));
    }

    #[test]
    fn normalize_preserves_code_blocks() {
        let html = page(
            "<article><h1>Code</h1><pre><code class=\"language-python\">print(\"hi\")</code></pre></article>",
        );
        let doc = normalize(&html, URL).unwrap();
        assert!(doc.content.contains("print(\"hi\")"));
        assert!(doc.content.contains("```"));
    }

    #[test]
    fn normalize_empty_article_still_document() {
        let html = page("<article></article>");
        let doc = normalize(&html, URL).unwrap();
        assert!(doc.content.trim().is_empty() || doc.content == "\n");
    }
}
