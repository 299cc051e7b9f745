//! Source URL classification and URL-derived metadata.
//!
//! A source URL is routed down one of three handling paths:
//!
//! | Class | Handling |
//! |-------|----------|
//! | [`SourceKind::Feed`] | parsed as a syndication feed |
//! | [`SourceKind::SpecificArticle`] | fetched and extracted directly |
//! | [`SourceKind::BlogIndex`] | link discovery, then per-article extraction |
//!
//! The ordering is load-bearing: the feed check runs first, so a feed
//! URL that happens to contain `/blog/` still classifies as a feed.
//! Classification is a pure function of the URL string.

use url::Url;

/// The handling path chosen for a source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Syndication feed (RSS/Atom).
    Feed,
    /// A single, already-specific article page.
    SpecificArticle,
    /// A blog index page requiring link discovery.
    BlogIndex,
}

/// Substrings marking a URL as a syndication feed.
const FEED_INDICATORS: &[&str] = &["/feed", "/rss", ".xml", "/atom"];

/// Path patterns indicating a specific article rather than an index.
const ARTICLE_PATH_PATTERNS: &[&str] = &["/blog/", "/articles/", "/news/", "/post/", "/story/"];

/// Path patterns excluding a URL from specific-article treatment
/// (indexes, listings, taxonomy pages).
const ARTICLE_EXCLUSIONS: &[&str] = &[
    "/blog/page/",
    "/blog/category/",
    "/blog/tag/",
    "/blog/author/",
    "/blog/archive/",
    "/tag/",
    "/category/",
    "/page/",
    "/archive/",
    "/feed",
    "/rss",
];

/// Normalize a raw source URL: default to https when no scheme is
/// given, strip any trailing slash.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    url.trim_end_matches('/').to_string()
}

/// Decide the handling path for a URL. Pure and deterministic.
pub fn classify(url: &str) -> SourceKind {
    let lower = url.to_lowercase();
    if FEED_INDICATORS.iter().any(|ind| lower.contains(ind)) {
        return SourceKind::Feed;
    }
    if is_specific_article(&lower) {
        return SourceKind::SpecificArticle;
    }
    SourceKind::BlogIndex
}

/// Whether a URL points at one article rather than a blog index.
///
/// Requires an article path pattern, no exclusion pattern, and at least
/// two non-empty path segments (`/blog/some-post` qualifies, `/blog`
/// does not).
fn is_specific_article(lower_url: &str) -> bool {
    let path = match Url::parse(lower_url) {
        Ok(u) => u.path().to_string(),
        Err(_) => return false,
    };

    let matches_pattern = ARTICLE_PATH_PATTERNS.iter().any(|p| path.contains(p));
    let excluded = path.trim_end_matches('/').ends_with("/blog")
        || ARTICLE_EXCLUSIONS.iter().any(|p| path.contains(p));
    let segments = path.split('/').filter(|s| !s.is_empty()).count();

    matches_pattern && !excluded && segments >= 2
}

/// Derive a company name from the registered domain of a URL.
///
/// Takes the label before the TLD (`www.` stripped) and capitalizes it:
/// `https://blog.wiz.io/feed` becomes `Wiz`.
pub fn company_name(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let parts: Vec<&str> = host.split('.').collect();
    let label = if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        host
    };
    crate::utils::upcase(label)
}
