//! Batch orchestration: routing, politeness, deduplication, aggregation.
//!
//! The engine is the sole entry point consumed by callers:
//! [`Engine::extract_articles`] takes a list of source requests and
//! returns a structurally valid [`ExtractionBatchResult`] — articles
//! (possibly empty) plus per-source error strings (possibly empty),
//! never a thrown failure for partial source problems.
//!
//! Sources are processed in caller order with an inter-source delay (a
//! scheduling pause on this task, not a process-wide block). Within a
//! blog index, article pages are fetched concurrently under a bounded
//! worker cap; no ordering is guaranteed between them.

use crate::ai_extract::{LinkCandidate, LinkExtractor, html_to_text};
use crate::article;
use crate::classify::{self, SourceKind, company_name, normalize_url};
use crate::discover;
use crate::error::ScrapeError;
use crate::feed;
use crate::fetch::{ExternalFetcher, FEED_ACCEPT, FetchChain};
use crate::models::{ArticleDraft, ExtractionBatchResult, SourceRequest, UNTITLED};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// The extraction engine for one or more batches.
///
/// Owns the fetch chain (and with it the per-host connection caps and
/// the advisory cache) for the duration of each batch. No shared
/// mutable state survives a call to [`Engine::extract_articles`].
pub struct Engine {
    settings: Arc<crate::settings::Settings>,
    fetcher: FetchChain,
    link_extractor: Option<Arc<dyn LinkExtractor>>,
}

/// The result of handling one source, before aggregation.
struct SourceOutcome {
    url: String,
    max_articles: usize,
    result: Result<Vec<ArticleDraft>, ScrapeError>,
}

impl Engine {
    /// Build an engine, validating settings before any I/O.
    pub fn new(settings: crate::settings::Settings) -> Result<Self, ScrapeError> {
        settings.validate()?;
        let settings = Arc::new(settings);
        Ok(Self {
            fetcher: FetchChain::new(settings.clone())?,
            settings,
            link_extractor: None,
        })
    }

    /// Attach the AI-assisted link-extraction collaborator used when
    /// structural discovery finds nothing.
    pub fn with_link_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.link_extractor = Some(extractor);
        self
    }

    /// Replace the external fetch tool (used by tests).
    pub fn with_external_fetcher(mut self, external: Arc<dyn ExternalFetcher>) -> Self {
        self.fetcher.set_external(external);
        self
    }

    /// Process a batch of sources into deduplicated articles plus
    /// per-source errors.
    #[instrument(level = "info", skip_all, fields(sources = sources.len()))]
    pub async fn extract_articles(&self, sources: &[SourceRequest]) -> ExtractionBatchResult {
        let delay = Duration::from_secs_f64(self.settings.request_delay_seconds);
        let mut outcomes = Vec::with_capacity(sources.len());

        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                // Politeness pause between sources; other tasks on the
                // runtime keep running.
                sleep(delay).await;
            }
            let url = normalize_url(&source.url);
            let result = self.extract_source(&url, source.max_articles).await;
            match &result {
                Ok(drafts) => info!(%url, count = drafts.len(), "Source processed"),
                Err(e) => warn!(%url, error = %e, "Source failed"),
            }
            outcomes.push(SourceOutcome {
                url,
                max_articles: source.max_articles,
                result,
            });
        }

        merge_outcomes(outcomes)
    }

    async fn extract_source(
        &self,
        url: &str,
        max_articles: usize,
    ) -> Result<Vec<ArticleDraft>, ScrapeError> {
        let min_bytes = self.settings.min_content_bytes;
        match classify::classify(url) {
            SourceKind::Feed => {
                debug!(%url, "Classified as feed");
                let result = self
                    .fetcher
                    .fetch_with_headers(url, min_bytes, &[("Accept", FEED_ACCEPT)])
                    .await;
                if !result.is_success() {
                    return Err(ScrapeError::Unreachable {
                        url: url.to_string(),
                    });
                }
                feed::parse_entries(result.body.as_bytes(), url, max_articles)
            }
            SourceKind::SpecificArticle => {
                debug!(%url, "Classified as specific article");
                match article::extract(&self.fetcher, url, min_bytes).await {
                    Some(draft) => Ok(vec![draft]),
                    None => Err(ScrapeError::EmptyExtraction {
                        url: url.to_string(),
                    }),
                }
            }
            SourceKind::BlogIndex => {
                debug!(%url, "Classified as blog index");
                self.extract_index(url, max_articles, min_bytes).await
            }
        }
    }

    async fn extract_index(
        &self,
        url: &str,
        max_articles: usize,
        min_bytes: usize,
    ) -> Result<Vec<ArticleDraft>, ScrapeError> {
        let result = self.fetcher.fetch(url, min_bytes).await;
        if !result.is_success() {
            return Err(ScrapeError::Unreachable {
                url: url.to_string(),
            });
        }
        let base = Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;

        let links = discover::discover_links(&result.body, &base);
        if !links.is_empty() {
            return Ok(self.extract_pages(links, max_articles, min_bytes).await);
        }

        match &self.link_extractor {
            Some(extractor) => {
                info!(%url, "Structural discovery empty; trying AI-assisted extraction");
                let page_text = html_to_text(&result.body);
                let candidates = extractor
                    .extract_links(&page_text, url, max_articles)
                    .await?;
                Ok(self
                    .extract_candidates(url, candidates, min_bytes)
                    .await)
            }
            None => {
                warn!(%url, "No article links found and no link extractor configured");
                Ok(Vec::new())
            }
        }
    }

    /// Fetch and extract discovered article pages concurrently. Pages
    /// that fail extraction are skipped; completion order is not
    /// significant.
    async fn extract_pages(
        &self,
        links: Vec<Url>,
        max_articles: usize,
        min_bytes: usize,
    ) -> Vec<ArticleDraft> {
        stream::iter(links.into_iter().take(max_articles))
            .map(|link| async move {
                article::extract(&self.fetcher, link.as_str(), min_bytes).await
            })
            .buffer_unordered(self.settings.max_concurrent_requests)
            .filter_map(|draft| std::future::ready(draft))
            .collect()
            .await
    }

    /// Fetch AI-suggested candidates; when a page resists extraction
    /// the candidate still yields a degraded draft (its title, empty
    /// content) so downstream consumers can decide relevance.
    async fn extract_candidates(
        &self,
        source_url: &str,
        candidates: Vec<LinkCandidate>,
        min_bytes: usize,
    ) -> Vec<ArticleDraft> {
        let company = company_name(source_url);
        stream::iter(candidates)
            .map(|candidate| {
                let company = company.clone();
                async move {
                    match article::extract(&self.fetcher, &candidate.url, min_bytes).await {
                        Some(mut draft) => {
                            if draft.title == UNTITLED && !candidate.title.trim().is_empty() {
                                draft.title = candidate.title.trim().to_string();
                            }
                            Some(draft)
                        }
                        None => {
                            ArticleDraft::new(&candidate.url, candidate.title.trim(), "", company)
                                .ok()
                        }
                    }
                }
            })
            .buffer_unordered(self.settings.max_concurrent_requests)
            .filter_map(|draft| std::future::ready(draft))
            .collect()
            .await
    }
}

/// Merge per-source outcomes into the final batch result.
///
/// Maintains a seen-URL set across sources in caller order; the first
/// occurrence of a canonical URL wins and later duplicates are dropped
/// silently (counted, not surfaced as errors — duplication across
/// company blogs is expected). The per-source cap counts retained
/// articles, so duplicates do not consume a source's budget.
fn merge_outcomes(outcomes: Vec<SourceOutcome>) -> ExtractionBatchResult {
    let mut seen: HashSet<String> = HashSet::new();
    let mut articles = Vec::new();
    let mut errors = Vec::new();
    let mut duplicates = 0usize;

    for outcome in outcomes {
        match outcome.result {
            Ok(drafts) => {
                let mut kept = 0usize;
                for draft in drafts {
                    if kept >= outcome.max_articles {
                        break;
                    }
                    if seen.insert(draft.url.clone()) {
                        articles.push(draft);
                        kept += 1;
                    } else {
                        duplicates += 1;
                    }
                }
            }
            Err(e) => errors.push(format!("Error scraping {}: {e}", outcome.url)),
        }
    }

    if duplicates > 0 {
        debug!(duplicates, "Dropped duplicate canonical URLs");
    }
    info!(
        articles = articles.len(),
        errors = errors.len(),
        "Batch aggregation complete"
    );
    ExtractionBatchResult { articles, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_extract::LinkCandidate;
    use crate::settings::Settings;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn draft(url: &str, title: &str) -> ArticleDraft {
        ArticleDraft::new(url, title, "some body text", "Co").unwrap()
    }

    fn ok_outcome(url: &str, max: usize, drafts: Vec<ArticleDraft>) -> SourceOutcome {
        SourceOutcome {
            url: url.to_string(),
            max_articles: max,
            result: Ok(drafts),
        }
    }

    #[test]
    fn test_first_seen_wins_across_sources() {
        let result = merge_outcomes(vec![
            ok_outcome(
                "https://a.com/blog",
                5,
                vec![draft("https://co.com/blog/a", "from source one")],
            ),
            ok_outcome(
                "https://b.com/blog",
                5,
                vec![draft("https://co.com/blog/a", "from source two")],
            ),
        ]);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].title, "from source one");
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_no_two_entries_share_a_url() {
        let result = merge_outcomes(vec![
            ok_outcome(
                "https://a.com/blog",
                5,
                vec![
                    draft("https://co.com/blog/a", "a"),
                    draft("https://co.com/blog/a", "a dup"),
                    draft("https://co.com/blog/b", "b"),
                ],
            ),
            ok_outcome(
                "https://b.com/blog",
                5,
                vec![draft("https://co.com/blog/b", "b dup")],
            ),
        ]);
        let urls: Vec<&str> = result.articles.iter().map(|a| a.url.as_str()).collect();
        let unique: HashSet<&&str> = urls.iter().collect();
        assert_eq!(urls.len(), unique.len());
        assert_eq!(urls, vec!["https://co.com/blog/a", "https://co.com/blog/b"]);
    }

    #[test]
    fn test_per_source_cap_counts_retained_articles() {
        let result = merge_outcomes(vec![ok_outcome(
            "https://a.com/blog",
            2,
            vec![
                draft("https://co.com/blog/a", "a"),
                draft("https://co.com/blog/b", "b"),
                draft("https://co.com/blog/c", "c"),
            ],
        )]);
        assert_eq!(result.articles.len(), 2);
    }

    #[test]
    fn test_failed_source_contributes_one_error_and_no_articles() {
        let result = merge_outcomes(vec![
            SourceOutcome {
                url: "https://bad.example/timeout".to_string(),
                max_articles: 5,
                result: Err(ScrapeError::Unreachable {
                    url: "https://bad.example/timeout".to_string(),
                }),
            },
            ok_outcome(
                "https://a.com/blog",
                5,
                vec![draft("https://co.com/blog/a", "a")],
            ),
        ]);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("https://bad.example/timeout"));
    }

    /// External fetcher that serves canned bodies by URL (the URL is
    /// the final curl argument) and never touches the network.
    struct RoutingFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl ExternalFetcher for RoutingFetcher {
        async fn fetch(&self, args: &[String]) -> Option<String> {
            args.last().and_then(|url| self.pages.get(url)).cloned()
        }
    }

    struct FixedLinkExtractor {
        candidates: Vec<LinkCandidate>,
    }

    #[async_trait]
    impl LinkExtractor for FixedLinkExtractor {
        async fn extract_links(
            &self,
            _page_text: &str,
            _base_url: &str,
            max: usize,
        ) -> Result<Vec<LinkCandidate>, ScrapeError> {
            Ok(self.candidates.iter().take(max).cloned().collect())
        }
    }

    fn fast_settings() -> Settings {
        let mut settings = Settings::default();
        settings.request_delay_seconds = 0.1;
        settings.request_timeout_seconds = 5;
        settings
    }

    fn article_page(title: &str) -> String {
        format!(
            "<html><body><article><h1>{title} And Its Consequences</h1><p>{}</p></article></body></html>",
            "body words that comfortably exceed the minimum content threshold ".repeat(4)
        )
    }

    // Primary fetches go to an unroutable localhost port and fail fast,
    // so these tests exercise the fallback path end to end.
    const BASE: &str = "http://127.0.0.1:9";

    #[tokio::test]
    async fn test_blog_index_pipeline_via_discovery() {
        let index = format!(
            "<html><body><a href=\"/blog/alpha\">Alpha</a><a href=\"/blog/tag/x\">Tag</a>\
             <a href=\"/blog/beta\">Beta</a>{}</body></html>",
            "padding to clear the minimum fetch size ".repeat(4)
        );
        let mut pages = HashMap::new();
        pages.insert(format!("{BASE}/blog"), index);
        pages.insert(format!("{BASE}/blog/alpha"), article_page("Alpha"));
        pages.insert(format!("{BASE}/blog/beta"), article_page("Beta"));

        let engine = Engine::new(fast_settings())
            .unwrap()
            .with_external_fetcher(Arc::new(RoutingFetcher { pages }));

        let sources = vec![SourceRequest::new(format!("{BASE}/blog"), 5).unwrap()];
        let result = engine.extract_articles(&sources).await;

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.articles.len(), 2);
        let urls: HashSet<&str> = result.articles.iter().map(|a| a.url.as_str()).collect();
        assert!(urls.contains(format!("{BASE}/blog/alpha").as_str()));
        assert!(urls.contains(format!("{BASE}/blog/beta").as_str()));
    }

    #[tokio::test]
    async fn test_feed_source_pipeline() {
        let feed_xml = format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel>
            <title>Co</title><link>{BASE}/blog</link><description>d</description>
            <item><title>Feed Post</title><link>{BASE}/blog/feed-post</link>
            <description>{}</description>
            <pubDate>Fri, 01 Mar 2024 08:00:00 GMT</pubDate></item>
            </channel></rss>"#,
            "summary text ".repeat(10)
        );
        let mut pages = HashMap::new();
        pages.insert(format!("{BASE}/feed.xml"), feed_xml);

        let engine = Engine::new(fast_settings())
            .unwrap()
            .with_external_fetcher(Arc::new(RoutingFetcher { pages }));

        let sources = vec![SourceRequest::new(format!("{BASE}/feed.xml"), 5).unwrap()];
        let result = engine.extract_articles(&sources).await;

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].title, "Feed Post");
    }

    #[tokio::test]
    async fn test_unreachable_source_records_exactly_one_error() {
        let engine = Engine::new(fast_settings())
            .unwrap()
            .with_external_fetcher(Arc::new(RoutingFetcher {
                pages: HashMap::new(),
            }));

        let source_url = format!("{BASE}/blog");
        let sources = vec![SourceRequest::new(source_url.clone(), 5).unwrap()];
        let result = engine.extract_articles(&sources).await;

        assert!(result.articles.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains(&source_url));
    }

    #[tokio::test]
    async fn test_ai_fallback_when_discovery_finds_nothing() {
        // Index page with no anchors at all: structural discovery must
        // yield nothing and control passes to the collaborator.
        let index = format!(
            "<html><body><div id=\"app\">{}</div></body></html>",
            "rendered client side ".repeat(10)
        );
        let mut pages = HashMap::new();
        pages.insert(format!("{BASE}/blog"), index);

        let engine = Engine::new(fast_settings())
            .unwrap()
            .with_external_fetcher(Arc::new(RoutingFetcher { pages }))
            .with_link_extractor(Arc::new(FixedLinkExtractor {
                candidates: vec![LinkCandidate {
                    title: "Hidden Post".to_string(),
                    url: format!("{BASE}/blog/hidden"),
                }],
            }));

        let sources = vec![SourceRequest::new(format!("{BASE}/blog"), 5).unwrap()];
        let result = engine.extract_articles(&sources).await;

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].title, "Hidden Post");
        assert_eq!(result.articles[0].word_count(), 0);
    }
}
