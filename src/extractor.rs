//! Article extraction: fetch one URL, pull structured content out of the
//! page, and normalize it into an [`Article`].
//!
//! Two capabilities meet here:
//! - [`FetchAsync`](crate::fetch::FetchAsync) retrieves the document
//! - [`ExtractContent`] turns raw HTML into an [`ExtractedContent`]
//!
//! [`ArticleExtractor`] composes them and applies the normalization rules:
//! the source domain comes from the URL host, missing authors become an
//! empty list, an undetermined language falls back to the configured
//! default, and `scraped_at` is stamped the moment extraction succeeds.
//!
//! # Selector Strategy
//!
//! [`HtmlContentExtractor`] tries CSS selectors in priority order per
//! field, starting with publisher-specific markup and falling back to
//! generic article structure. News sites restyle constantly; the fallback
//! chain is what keeps yield up across redesigns.

use crate::fetch::{FetchAsync, FetchError};
use crate::models::{Article, source_domain_of};
use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};

/// Per-URL failure while acquiring one article.
///
/// Both variants are isolated at the acquisition-loop boundary: they are
/// logged and the loop moves on to the next candidate.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The document could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The fetched document yielded no usable article content.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Error raised by an [`ExtractContent`] implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractionError(pub String);

/// Raw field values pulled from a fetched document, before normalization.
///
/// Every field is best-effort; deciding whether the result is usable is the
/// caller's job.
#[derive(Debug, Default)]
pub struct ExtractedContent {
    pub headline: Option<String>,
    pub body: Option<String>,
    pub authors: Vec<String>,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub language: Option<String>,
}

/// Capability: extract structured content from a fetched document.
///
/// Kept as a trait so the concrete extraction library (or a remote
/// extraction service) can be substituted without touching the pipeline.
pub trait ExtractContent {
    fn extract(&self, html: &str) -> Result<ExtractedContent, ExtractionError>;
}

static HEADLINE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"h1[data-gu-name="headline"]"#,
        r#"h1[itemprop="headline"]"#,
        "article h1",
        "h1",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static BODY_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"[data-gu-name="body"] p"#,
        r#"div[data-component="text-block"] p"#,
        ".article-body p",
        "article p",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static AUTHOR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"[data-component="contributor-byline"] a"#,
        r#"a[rel="author"]"#,
        ".byline a",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static AUTHOR_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());
static PUBLISHED_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static HTML_LANG: Lazy<Selector> = Lazy::new(|| Selector::parse("html[lang]").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs and trim.
fn squash(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_string()
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    squash(&element.text().collect::<Vec<_>>().join(" "))
}

/// CSS-selector-based [`ExtractContent`] implementation.
///
/// Works directly on the HTML with the `scraper` crate; no headless
/// browser, so script-rendered content is invisible by design.
#[derive(Debug, Default)]
pub struct HtmlContentExtractor;

impl ExtractContent for HtmlContentExtractor {
    fn extract(&self, html: &str) -> Result<ExtractedContent, ExtractionError> {
        let document = Html::parse_document(html);

        let headline = HEADLINE_SELECTORS
            .iter()
            .find_map(|selector| document.select(selector).next())
            .map(element_text)
            .filter(|text| !text.is_empty());

        let body = BODY_SELECTORS.iter().find_map(|selector| {
            let paragraphs: Vec<String> = document
                .select(selector)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();
            if paragraphs.is_empty() {
                None
            } else {
                Some(paragraphs.join("\n\n"))
            }
        });

        let mut authors: Vec<String> = AUTHOR_SELECTORS
            .iter()
            .find_map(|selector| {
                let names: Vec<String> = document
                    .select(selector)
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect();
                if names.is_empty() { None } else { Some(names) }
            })
            .unwrap_or_default();
        if authors.is_empty() {
            authors = document
                .select(&AUTHOR_META)
                .filter_map(|element| element.value().attr("content"))
                .map(squash)
                .filter(|text| !text.is_empty())
                .collect();
        }

        let published_at = document
            .select(&TIME_SELECTOR)
            .filter_map(|element| element.value().attr("datetime"))
            .chain(
                document
                    .select(&PUBLISHED_META)
                    .filter_map(|element| element.value().attr("content")),
            )
            .find_map(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok());

        let language = document
            .select(&HTML_LANG)
            .next()
            .and_then(|element| element.value().attr("lang"))
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty());

        Ok(ExtractedContent {
            headline,
            body,
            authors,
            published_at,
            language,
        })
    }
}

/// Capability consumed by the acquisition loop: one URL in, one
/// [`Article`] (or a classified per-URL failure) out.
pub trait ExtractArticle {
    async fn extract(&self, url: &str) -> Result<Article, ScrapeError>;
}

/// Production article extractor: fetch, extract, normalize.
pub struct ArticleExtractor<F, C> {
    fetcher: F,
    content: C,
    default_language: String,
}

impl<F, C> ArticleExtractor<F, C>
where
    F: FetchAsync,
    C: ExtractContent,
{
    /// # Arguments
    ///
    /// * `fetcher` - HTTP fetch capability (possibly retry-wrapped)
    /// * `content` - Content extraction capability
    /// * `default_language` - Language code used when the page declares none
    pub fn new(fetcher: F, content: C, default_language: impl Into<String>) -> Self {
        Self {
            fetcher,
            content,
            default_language: default_language.into(),
        }
    }
}

impl<F, C> ExtractArticle for ArticleExtractor<F, C>
where
    F: FetchAsync,
    C: ExtractContent,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<Article, ScrapeError> {
        let source_domain = source_domain_of(url)
            .ok_or_else(|| ScrapeError::Extraction(format!("url has no host: {url}")))?;

        let html = self.fetcher.fetch(url).await?;
        let content = self
            .content
            .extract(&html)
            .map_err(|e| ScrapeError::Extraction(e.to_string()))?;

        let headline = content
            .headline
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ScrapeError::Extraction("no headline found".to_string()))?;
        let body = content
            .body
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ScrapeError::Extraction("no article body found".to_string()))?;

        debug!(
            headline_chars = headline.len(),
            body_chars = body.len(),
            authors = content.authors.len(),
            "Extracted article"
        );

        Ok(Article {
            headline,
            body,
            authors: content.authors,
            published_at: content.published_at,
            language: content.language.unwrap_or_else(|| self.default_language.clone()),
            source_domain,
            url: url.to_string(),
            scraped_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en-GB">
<head>
  <meta property="article:published_time" content="2026-08-06T09:30:00+00:00">
</head>
<body>
  <article>
    <h1>  Parliament   passes the bill </h1>
    <div class="byline"><a rel="author">Jo Writer</a> and <a rel="author">Sam Reporter</a></div>
    <time datetime="2026-08-06T09:30:00+00:00">6 Aug 2026</time>
    <p>First paragraph of the story.</p>
    <p>   </p>
    <p>Second paragraph with
       a wrapped line.</p>
  </article>
</body>
</html>"#;

    struct CannedFetch(Result<&'static str, u16>);

    impl FetchAsync for CannedFetch {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            match self.0 {
                Ok(body) => Ok(body.to_string()),
                Err(code) => Err(FetchError::Status(
                    reqwest::StatusCode::from_u16(code).unwrap(),
                )),
            }
        }
    }

    #[test]
    fn test_html_extractor_full_article() {
        let content = HtmlContentExtractor.extract(ARTICLE_HTML).unwrap();

        assert_eq!(content.headline.as_deref(), Some("Parliament passes the bill"));
        assert_eq!(
            content.body.as_deref(),
            Some("First paragraph of the story.\n\nSecond paragraph with a wrapped line.")
        );
        assert_eq!(content.authors, vec!["Jo Writer", "Sam Reporter"]);
        assert_eq!(
            content.published_at.unwrap().to_rfc3339(),
            "2026-08-06T09:30:00+00:00"
        );
        assert_eq!(content.language.as_deref(), Some("en-gb"));
    }

    #[test]
    fn test_html_extractor_empty_document() {
        let content = HtmlContentExtractor
            .extract("<html><body><div>nothing here</div></body></html>")
            .unwrap();

        assert!(content.headline.is_none());
        assert!(content.body.is_none());
        assert!(content.authors.is_empty());
        assert!(content.published_at.is_none());
    }

    #[test]
    fn test_html_extractor_meta_author_fallback() {
        let html = r#"<html><head><meta name="author" content="Desk Staff"></head>
<body><article><h1>T</h1><p>Body.</p></article></body></html>"#;
        let content = HtmlContentExtractor.extract(html).unwrap();
        assert_eq!(content.authors, vec!["Desk Staff"]);
    }

    #[tokio::test]
    async fn test_article_extractor_normalizes() {
        let extractor = ArticleExtractor::new(CannedFetch(Ok(ARTICLE_HTML)), HtmlContentExtractor, "en");
        let article = extractor
            .extract("https://www.example.com/politics/bill")
            .await
            .unwrap();

        assert_eq!(article.headline, "Parliament passes the bill");
        assert_eq!(article.source_domain, "www.example.com");
        assert_eq!(article.language, "en-gb");
        assert_eq!(article.url, "https://www.example.com/politics/bill");
    }

    #[tokio::test]
    async fn test_article_extractor_language_fallback_and_empty_authors() {
        let html = "<html><body><article><h1>T</h1><p>Body text.</p></article></body></html>";
        let extractor = ArticleExtractor::new(CannedFetch(Ok(html)), HtmlContentExtractor, "en");
        let article = extractor.extract("https://example.com/a").await.unwrap();

        assert_eq!(article.language, "en");
        assert!(article.authors.is_empty());
        assert!(article.published_at.is_none());
    }

    #[tokio::test]
    async fn test_article_extractor_no_body_is_extraction_failure() {
        let html = "<html><body><h1>Headline only</h1></body></html>";
        let extractor = ArticleExtractor::new(CannedFetch(Ok(html)), HtmlContentExtractor, "en");
        let err = extractor.extract("https://example.com/a").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_article_extractor_fetch_failure_classified() {
        let extractor = ArticleExtractor::new(CannedFetch(Err(404)), HtmlContentExtractor, "en");
        let err = extractor.extract("https://example.com/a").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_article_extractor_hostless_url() {
        let extractor = ArticleExtractor::new(CannedFetch(Ok(ARTICLE_HTML)), HtmlContentExtractor, "en");
        let err = extractor.extract("not-a-url").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }
}
