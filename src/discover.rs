//! Candidate article-link discovery on blog index pages.
//!
//! An ordered list of structural selectors is applied to the fetched
//! index page, most specific blog-link patterns first and generic
//! anchor-in-heading patterns last. The chain stops at the first
//! selector that yields any valid candidates; results are never merged
//! across selectors. Candidates are resolved to absolute URLs, scoped
//! to the index page's host, filtered against article/non-article path
//! patterns, deduplicated by exact URL, and capped.

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Cap on candidates collected from one index page.
pub const MAX_CANDIDATES: usize = 50;

/// Structural selectors in priority order.
const LINK_SELECTORS: &[&str] = &[
    // Modern blog frameworks (Next.js, React, etc.)
    "a[href^=\"/blog/\"]",
    "article a[href^=\"/blog/\"]",
    "section a[href^=\"/blog/\"]",
    // Traditional blog markup
    "h2 a[href^=\"/blog/\"]",
    "h3 a[href^=\"/blog/\"]",
    ".post-title a[href^=\"/blog/\"]",
    ".entry-title a[href^=\"/blog/\"]",
    // Generic article links
    "a[href*=\"/blog/\"]",
    ".blog-post a[href*=\"/blog/\"]",
    // Last-resort anchors in headings and title blocks
    "h2 a",
    "h3 a",
    ".post-title a",
    ".entry-title a",
    "article a",
    ".blog-title a",
];

static PARSED_LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    LINK_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static link selector"))
        .collect()
});

/// Path patterns a candidate must contain to count as an article.
const VALID_PATH_PATTERNS: &[&str] = &["/blog/", "/articles/", "/news/", "/post/", "/story/"];

/// Path patterns disqualifying a candidate (listings, taxonomies,
/// feeds, search).
const INVALID_PATH_PATTERNS: &[&str] = &[
    "/blog/tag/",
    "/blog/category/",
    "/blog/author/",
    "/blog/page/",
    "/blog/archive/",
    "/tag/",
    "/category/",
    "/author/",
    "/page/",
    "/archive/",
    "/search",
    "/feed",
    "/rss",
];

/// Discover candidate article links on an index page.
///
/// Returns absolute, validated, deduplicated URLs in page order. An
/// empty result signals the caller to fall back to AI-assisted
/// extraction.
pub fn discover_links(page_html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(page_html);

    for (i, selector) in PARSED_LINK_SELECTORS.iter().enumerate() {
        let candidates: Vec<Url> = document
            .select(selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base_url.join(href).ok())
            .filter(|resolved| is_valid_article_url(resolved, base_url))
            .unique()
            .take(MAX_CANDIDATES)
            .collect();

        if !candidates.is_empty() {
            info!(
                selector = LINK_SELECTORS[i],
                count = candidates.len(),
                "Discovered article links"
            );
            debug!(urls = ?candidates.iter().map(Url::as_str).collect::<Vec<_>>(), "Candidates");
            return candidates;
        }
    }

    debug!("No structural selector yielded candidates");
    Vec::new()
}

/// Validate a resolved candidate: same host as the index page, an
/// article path pattern present, no listing/taxonomy pattern, and a
/// path strictly longer than `/blog/`.
pub fn is_valid_article_url(candidate: &Url, base_url: &Url) -> bool {
    if candidate.host_str() != base_url.host_str() {
        return false;
    }

    let path = candidate.path().to_lowercase();
    let valid = VALID_PATH_PATTERNS.iter().any(|p| path.contains(p));
    let invalid = INVALID_PATH_PATTERNS.iter().any(|p| path.contains(p));

    valid && !invalid && path.len() > "/blog/".len()
}
