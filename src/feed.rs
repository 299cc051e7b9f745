//! Syndication feed extraction (RSS/Atom).
//!
//! Feed entries become [`ArticleDraft`]s: the entry link is the
//! canonical URL, the first non-empty of summary/content-body supplies
//! the text, and publish dates come from the feed parser (falling back
//! to the minimum sentinel for ordering). Up to `2 × max` entries are
//! collected to leave room for cross-source duplicates, sorted
//! descending by recency with a stable sort (ties keep feed order),
//! then truncated to `max`.

use crate::article::{clean_text, visible_text};
use crate::classify::company_name;
use crate::dates;
use crate::error::ScrapeError;
use crate::models::{ArticleDraft, UNTITLED};
use scraper::Html;
use std::cmp::Reverse;
use tracing::{debug, info, instrument};

/// Parse feed bytes into recency-ordered article drafts.
///
/// A parse failure is returned as a single [`ScrapeError::FeedParse`];
/// entries without a usable link are skipped silently.
#[instrument(level = "info", skip(bytes), fields(url = %source_url))]
pub fn parse_entries(
    bytes: &[u8],
    source_url: &str,
    max: usize,
) -> Result<Vec<ArticleDraft>, ScrapeError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| ScrapeError::FeedParse {
        url: source_url.to_string(),
        reason: e.to_string(),
    })?;

    let company = company_name(source_url);
    let total_entries = feed.entries.len();

    let mut drafts: Vec<ArticleDraft> = feed
        .entries
        .into_iter()
        .take(max * 2)
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone())?;

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string());

            // Ordered field lookup: summary/description first, then the
            // content body; first non-empty value wins.
            let raw_content = entry
                .summary
                .map(|t| t.content)
                .filter(|c| !c.trim().is_empty())
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            let mut draft =
                ArticleDraft::new(link, title, strip_markup(&raw_content), company.clone()).ok()?;
            draft.author = entry
                .authors
                .first()
                .map(|p| p.name.trim().to_string())
                .filter(|a| !a.is_empty());
            draft.publish_date = entry.published;
            Some(draft)
        })
        .collect();

    // Stable sort: entries without a date sink to the end, feed order
    // breaks ties.
    drafts.sort_by_key(|d| Reverse(d.publish_date.unwrap_or(dates::MIN_INSTANT)));
    drafts.truncate(max);

    info!(
        entries = total_entries,
        kept = drafts.len(),
        "Extracted feed entries"
    );
    debug!(urls = ?drafts.iter().map(|d| d.url.as_str()).collect::<Vec<_>>(), "Feed drafts");
    Ok(drafts)
}

/// Reduce feed entry markup (summaries are frequently HTML fragments)
/// to cleaned plain text.
fn strip_markup(raw: &str) -> String {
    if !raw.contains('<') {
        return clean_text(raw);
    }
    let fragment = Html::parse_fragment(raw);
    clean_text(&visible_text(fragment.root_element()))
}
