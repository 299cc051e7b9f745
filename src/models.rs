//! Data models for source requests, extracted articles, and batch results.
//!
//! This module defines the core data structures flowing through the engine:
//! - [`SourceRequest`]: a caller-supplied URL plus a max-articles bound
//! - [`ArticleDraft`]: an extracted, not-yet-deduplicated article record
//! - [`FetchResult`]: the outcome of one fetch-strategy-chain invocation
//! - [`ExtractionBatchResult`]: the deduplicated articles and per-source
//!   errors returned to the caller
//!
//! All types are created fresh per batch invocation; the engine retains
//! no shared mutable state after returning an [`ExtractionBatchResult`].

use crate::error::ScrapeError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Bounds for the per-source article cap.
pub const MAX_ARTICLES_MIN: usize = 1;
pub const MAX_ARTICLES_MAX: usize = 50;

/// A caller-supplied source URL plus a per-source article cap.
///
/// Immutable once created. The bound check is the one contract
/// violation the engine fails fast on, before any I/O begins.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub url: String,
    pub max_articles: usize,
}

impl SourceRequest {
    /// Create a request, validating `max_articles` is within 1..=50.
    pub fn new(url: impl Into<String>, max_articles: usize) -> Result<Self, ScrapeError> {
        if !(MAX_ARTICLES_MIN..=MAX_ARTICLES_MAX).contains(&max_articles) {
            return Err(ScrapeError::InvalidSettings(format!(
                "max_articles must be between {MAX_ARTICLES_MIN} and {MAX_ARTICLES_MAX}, got {max_articles}"
            )));
        }
        Ok(Self {
            url: url.into(),
            max_articles,
        })
    }
}

/// Sentinel title used when no candidate heading qualifies.
pub const UNTITLED: &str = "Untitled";

/// An extracted article, pre-deduplication.
///
/// The canonical `url` is the deduplication identity key. `content` may
/// be empty when extraction degraded; such drafts are still returned so
/// downstream consumers can decide relevance.
///
/// `word_count` is derived from `content` at construction and via
/// [`ArticleDraft::set_content`]; it cannot be set independently, so the
/// `word_count == whitespace tokens of content` invariant always holds.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDraft {
    /// Canonical absolute http(s) URL; the dedup identity key.
    pub url: String,
    /// Article title, or `"Untitled"` when no candidate was found.
    pub title: String,
    /// Company name derived from the registered domain of the source URL.
    pub company_name: String,
    /// Byline author, when a source exposes one.
    pub author: Option<String>,
    /// Normalized publish instant; absent when extraction failed.
    pub publish_date: Option<DateTime<Utc>>,
    content: String,
    word_count: usize,
}

impl ArticleDraft {
    /// Build a draft, validating the URL scheme and deriving `word_count`.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Result<Self, ScrapeError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ScrapeError::InvalidUrl(url));
        }
        let content = content.into();
        let word_count = count_words(&content);
        Ok(Self {
            url,
            title: title.into(),
            company_name: company_name.into(),
            author: None,
            publish_date: None,
            content,
            word_count,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Replace the content, recomputing the derived word count.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.word_count = count_words(&self.content);
    }
}

/// Whitespace-token count used for `word_count`.
pub fn count_words(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Which half of the fetch strategy chain produced a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchStrategy {
    /// The in-process HTTP client.
    Primary,
    /// The external fetch tool (proxy-aware, retrying, longer timeout).
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    /// A body was obtained but fell below the minimum-content threshold.
    Insufficient,
    Failed,
}

/// Transient result of one fetch-strategy-chain invocation. Not persisted.
#[derive(Debug)]
pub struct FetchResult {
    pub body: String,
    pub strategy: FetchStrategy,
    pub status: FetchStatus,
}

impl FetchResult {
    pub fn failed() -> Self {
        Self {
            body: String::new(),
            strategy: FetchStrategy::Fallback,
            status: FetchStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// The final product of a batch: deduplicated articles in first-seen
/// order plus a parallel list of per-source error messages.
///
/// Always structurally valid: both lists may be empty, but the caller
/// never receives a thrown failure for partial source problems.
#[derive(Debug, Default, Serialize)]
pub struct ExtractionBatchResult {
    pub articles: Vec<ArticleDraft>,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_request_bounds() {
        assert!(SourceRequest::new("https://co.com/blog", 1).is_ok());
        assert!(SourceRequest::new("https://co.com/blog", 50).is_ok());
        assert!(SourceRequest::new("https://co.com/blog", 0).is_err());
        assert!(SourceRequest::new("https://co.com/blog", 51).is_err());
    }

    #[test]
    fn test_draft_rejects_non_http_url() {
        assert!(ArticleDraft::new("ftp://co.com/a", "T", "", "Co").is_err());
        assert!(ArticleDraft::new("https://co.com/a", "T", "", "Co").is_ok());
    }

    #[test]
    fn test_word_count_tracks_content() {
        let mut draft =
            ArticleDraft::new("https://co.com/blog/a", "Title", "one two  three", "Co").unwrap();
        assert_eq!(draft.word_count(), 3);

        draft.set_content("now four words here");
        assert_eq!(draft.word_count(), 4);
        assert_eq!(draft.word_count(), count_words(draft.content()));

        draft.set_content("");
        assert_eq!(draft.word_count(), 0);
    }

    #[test]
    fn test_batch_result_serializes() {
        let draft = ArticleDraft::new("https://co.com/blog/a", "Title", "body text", "Co").unwrap();
        let result = ExtractionBatchResult {
            articles: vec![draft],
            errors: vec!["Error scraping https://bad.example: timeout".to_string()],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("https://co.com/blog/a"));
        assert!(json.contains("word_count"));
        assert!(json.contains("bad.example"));
    }
}
