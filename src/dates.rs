//! Timestamp normalization for heterogeneous feed and page dates.
//!
//! Feeds and blog pages disagree wildly about date formats: RFC 2822
//! with and without numeric zones, ISO 8601 with and without offsets,
//! bare dates, locale-ish strings. [`normalize`] funnels all of them
//! into a single comparable [`DateTime<Utc>`], returning a minimum
//! sentinel when nothing parses so that undated entries sort last in
//! descending-recency order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Sentinel returned when a timestamp cannot be parsed.
///
/// Sorts after every real date when ordering by recency (descending).
pub const MIN_INSTANT: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Fixed layouts tried after the flexible parser, covering feed date
/// variants that `dateparser` occasionally rejects.
const NAIVE_LAYOUTS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S GMT",
    "%a, %d %b %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_ONLY_LAYOUTS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

/// Parse a raw timestamp string into a comparable instant.
///
/// Tries, in order: RFC 3339, RFC 2822, the general flexible parser,
/// then a fixed list of known feed layouts. Returns [`MIN_INSTANT`]
/// when `raw` is empty or nothing matches. Never fails; pure, no I/O.
pub fn normalize(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return MIN_INSTANT;
    }

    // Fast paths for the two formats feeds actually advertise.
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(dt) = dateparser::parse(raw) {
        return dt.with_timezone(&Utc);
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return DateTime::from_naive_utc_and_offset(naive, Utc);
        }
    }
    for layout in DATE_ONLY_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, layout) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return DateTime::from_naive_utc_and_offset(naive, Utc);
            }
        }
    }

    debug!(raw, "Could not parse date; using minimum sentinel");
    MIN_INSTANT
}
