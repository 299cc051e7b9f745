//! Single-article content extraction.
//!
//! Given a fetched article page, this module picks the best content
//! block (ordered selector chain, falling back to the largest text
//! block), scores title candidates by tag specificity, strips
//! boilerplate tail phrases, and attempts publish-date extraction.
//!
//! The selector chains and scoring weights are empirically tuned
//! against common blog templates; they are constants here, not
//! invariants.

use crate::classify::company_name;
use crate::dates;
use crate::fetch::FetchChain;
use crate::models::{ArticleDraft, UNTITLED};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Minimum text length for an ordered-selector content match.
pub const MIN_CONTENT_CHARS: usize = 50;
/// Minimum text length for the largest-text-block fallback.
pub const MIN_FALLBACK_BLOCK_CHARS: usize = 200;
/// Minimum length for a title candidate to be considered substantial.
pub const MIN_TITLE_CHARS: usize = 10;

/// Elements whose text never belongs to article content.
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "aside", "noscript"];

/// Content selectors in priority order: semantic tags and modern
/// framework patterns first, traditional blog classes after.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[data-layout=\"content\"]",
    ".prose",
    ".content",
    ".article-content",
    ".post-content",
    ".entry-content",
    "main main",
    "[itemprop=\"articleBody\"]",
    ".blog-post-content",
    ".post-body",
    ".entry-body",
    ".story-content",
    "[role=\"main\"] article",
    "section[class*=\"content\"]",
];

/// Title selectors paired with their specificity score. Among all
/// substantial candidates the highest score wins; ties keep the
/// earliest match.
const TITLE_SELECTORS: &[(&str, u32)] = &[
    ("h1", 10),
    ("h2", 8),
    ("h3", 6),
    ("title", 4),
    (".article-title", 2),
    (".post-title", 2),
    (".entry-title", 2),
    ("[class*=\"title\"]", 2),
];

static PARSED_CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static content selector"))
        .collect()
});

static PARSED_TITLE_SELECTORS: Lazy<Vec<(Selector, u32)>> = Lazy::new(|| {
    TITLE_SELECTORS
        .iter()
        .map(|(s, score)| (Selector::parse(s).expect("static title selector"), *score))
        .collect()
});

static FALLBACK_BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, section, main, article").expect("static block selector"));

static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time").expect("static time selector"));

static SPAN_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span").expect("static span selector"));

static DATE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)date").expect("static regex"));

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Original story from.*",
        r"(?i)Read more.*",
        r"(?i)Continue reading.*",
        r"(?i)View comments.*",
        r"(?i)Share this:\w*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Fetch an article page and extract a structured draft.
///
/// Returns `None` on total failure (unreachable page or no content
/// block located); the caller records that as an error. Partial
/// extraction still yields a draft with defaults.
#[instrument(level = "info", skip(fetcher), fields(%url))]
pub async fn extract(fetcher: &FetchChain, url: &str, min_bytes: usize) -> Option<ArticleDraft> {
    let result = fetcher.fetch(url, min_bytes).await;
    if !result.is_success() {
        return None;
    }
    parse_article(&result.body, url)
}

/// Extract a draft from already-fetched page HTML. Pure, synchronous.
pub fn parse_article(html: &str, url: &str) -> Option<ArticleDraft> {
    let document = Html::parse_document(html);

    let content = select_content(&document)?;
    let title = select_title(&document).unwrap_or_else(|| UNTITLED.to_string());
    let publish_date = select_publish_date(&document);

    let mut draft = ArticleDraft::new(url, title, content, company_name(url)).ok()?;
    draft.publish_date = publish_date;
    debug!(
        words = draft.word_count(),
        title = %draft.title,
        dated = draft.publish_date.is_some(),
        "Extracted article"
    );
    Some(draft)
}

/// Whether an element sits inside a non-content subtree; such elements
/// are invisible to every selection step, matching a document that had
/// those subtrees removed before scanning.
fn in_stripped_subtree(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| STRIPPED_TAGS.contains(&a.value().name()))
}

/// Pick the content block: first ordered selector whose visible text
/// exceeds [`MIN_CONTENT_CHARS`], else the largest text block over
/// [`MIN_FALLBACK_BLOCK_CHARS`].
fn select_content(document: &Html) -> Option<String> {
    for selector in PARSED_CONTENT_SELECTORS.iter() {
        if let Some(element) = document
            .select(selector)
            .find(|el| !in_stripped_subtree(*el))
        {
            let text = visible_text(element);
            if text.len() > MIN_CONTENT_CHARS {
                return Some(clean_text(&text));
            }
        }
    }

    largest_text_block(document).map(|text| clean_text(&text))
}

/// Largest contiguous visible-text block across container elements.
fn largest_text_block(document: &Html) -> Option<String> {
    document
        .select(&FALLBACK_BLOCK_SELECTOR)
        .filter(|el| !in_stripped_subtree(*el))
        .map(visible_text)
        .filter(|text| text.len() > MIN_FALLBACK_BLOCK_CHARS)
        .max_by_key(|text| text.len())
}

/// Score title candidates across the prioritized selector set and keep
/// the best substantial one.
fn select_title(document: &Html) -> Option<String> {
    let mut best: Option<String> = None;
    let mut best_score = 0u32;

    for (selector, score) in PARSED_TITLE_SELECTORS.iter() {
        for element in document.select(selector) {
            if in_stripped_subtree(element) {
                continue;
            }
            let text = collapse_whitespace(&visible_text(element));
            if text.len() > MIN_TITLE_CHARS && *score > best_score {
                best_score = *score;
                best = Some(text);
            }
        }
    }
    best
}

/// Publish date from a `<time>` element (its `datetime` attribute or
/// text) or a date-classed `<span>`. Absent on failure, never an error.
fn select_publish_date(document: &Html) -> Option<DateTime<Utc>> {
    let raw = document
        .select(&TIME_SELECTOR)
        .find(|el| !in_stripped_subtree(*el))
        .map(|el| {
            el.value()
                .attr("datetime")
                .map(|s| s.to_string())
                .unwrap_or_else(|| visible_text(el))
        })
        .or_else(|| {
            document
                .select(&SPAN_SELECTOR)
                .find(|el| {
                    !in_stripped_subtree(*el)
                        && el
                            .value()
                            .attr("class")
                            .is_some_and(|c| DATE_CLASS.is_match(c))
                })
                .map(|el| visible_text(el))
        })?;

    let normalized = dates::normalize(raw.trim());
    (normalized != dates::MIN_INSTANT).then_some(normalized)
}

/// Collect the visible text of an element, skipping subtrees of
/// non-content tags (scripts, styles, navigation, footers, sidebars).
pub fn visible_text(root: ElementRef) -> String {
    let root_id = root.id();
    let mut out = String::new();
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .ancestors()
                .take_while(|a| a.id() != root_id)
                .any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|el| STRIPPED_TAGS.contains(&el.name()))
                });
            if !hidden {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push(' ');
                }
            }
        }
    }
    out.trim_end().to_string()
}

/// Collapse whitespace runs and strip known boilerplate tail phrases.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = collapse_whitespace(text);
    for pattern in BOILERPLATE.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
