//! AI-assisted link extraction for JS-heavy index pages.
//!
//! When structural link discovery finds nothing, the fetched page is
//! converted to a readable text representation and handed to an
//! external text-understanding collaborator that returns candidate
//! `(title, url)` pairs. The collaborator sits behind the
//! [`LinkExtractor`] trait; the shipped implementation talks to an
//! OpenAI-compatible chat endpoint with exponential backoff and jitter.
//!
//! Malformed responses degrade: a failed JSON parse falls back to
//! best-effort extraction of `Title:` / `URL:` line pairs, and total
//! failure yields an empty list plus an error, never a crash.

use crate::error::ScrapeError;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::{Rng, rng};
use regex::Regex;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Upper bound on page text sent to the collaborator.
const MAX_PROMPT_CHARS: usize = 12_000;

const MAX_RETRIES: usize = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// One candidate article returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkCandidate {
    pub title: String,
    pub url: String,
}

/// Seam for the text-understanding collaborator.
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Return up to `max` candidate article links found in the page
    /// text, relative to `base_url`.
    async fn extract_links(
        &self,
        page_text: &str,
        base_url: &str,
        max: usize,
    ) -> Result<Vec<LinkCandidate>, ScrapeError>;
}

/// Convert page HTML to a readable text/markdown representation.
pub fn html_to_text(html: &str) -> String {
    // html2text falls back to the raw input rather than failing; the
    // collaborator copes with either.
    html2text::from_read(Cursor::new(html.as_bytes()), 80).unwrap_or_else(|_| html.to_string())
}

static TITLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*\**\s*Title\s*:\s*(.+?)\s*\**\s*$").expect("static regex"));
static URL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*\**\s*URL\s*:\s*(\S+)\s*\**\s*$").expect("static regex"));

/// Parse the collaborator's response into candidates.
///
/// Accepts a bare JSON array, a fenced JSON block, or — when neither
/// parses — `Title:` / `URL:` line pairs in document order.
pub fn parse_link_response(content: &str, max: usize) -> Vec<LinkCandidate> {
    if let Some(mut candidates) = parse_json_array(content) {
        candidates.retain(|c| c.url.starts_with("http://") || c.url.starts_with("https://"));
        candidates.truncate(max);
        return candidates;
    }

    // Best-effort line-pattern fallback.
    let titles: Vec<&str> = TITLE_LINE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let urls: Vec<&str> = URL_LINE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    titles
        .into_iter()
        .zip(urls)
        .filter(|(_, url)| url.starts_with("http://") || url.starts_with("https://"))
        .map(|(title, url)| LinkCandidate {
            title: title.to_string(),
            url: url.to_string(),
        })
        .take(max)
        .collect()
}

fn parse_json_array(content: &str) -> Option<Vec<LinkCandidate>> {
    let trimmed = content.trim();
    if let Ok(candidates) = serde_json::from_str::<Vec<LinkCandidate>>(trimmed) {
        return Some(candidates);
    }
    // Models habitually wrap JSON in prose or code fences.
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if start >= end {
        return None;
    }
    serde_json::from_str::<Vec<LinkCandidate>>(&trimmed[start..=end]).ok()
}

/// [`LinkExtractor`] backed by an OpenAI-compatible chat endpoint.
///
/// Retries transient failures with exponential backoff: up to 5
/// attempts, 1s base delay doubling per attempt, capped at 30s, with
/// 0–250ms of random jitter.
pub struct OpenAiLinkExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiLinkExtractor {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn prompt(page_text: &str, base_url: &str, max: usize) -> String {
        let bounded: String = page_text.chars().take(MAX_PROMPT_CHARS).collect();
        format!(
            "The following is the text of a blog index page at {base_url}. \
             Identify up to {max} links to individual articles. Respond with \
             a JSON array of objects with \"title\" and \"url\" fields, using \
             absolute URLs. Respond with the JSON array only.\n\n{bounded}"
        )
    }

    async fn ask(&self, prompt: &str) -> Result<String, String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0,
        });
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("chat endpoint returned {}", response.status()));
        }
        let parsed: ChatResponse = response.json().await.map_err(|e| e.to_string())?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| "chat response contained no choices".to_string())
    }

    async fn ask_with_backoff(&self, prompt: &str) -> Result<String, String> {
        let mut attempt = 0usize;
        loop {
            match self.ask(prompt).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        warn!(attempt, error = %e, "Link extraction exhausted retries");
                        return Err(e);
                    }
                    let mut delay = BASE_DELAY.saturating_mul(1u32 << (attempt - 1));
                    if delay > MAX_DELAY {
                        delay = MAX_DELAY;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);
                    warn!(attempt, max = MAX_RETRIES, ?delay, error = %e, "Link extraction attempt failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl LinkExtractor for OpenAiLinkExtractor {
    #[instrument(level = "info", skip_all, fields(%base_url, max))]
    async fn extract_links(
        &self,
        page_text: &str,
        base_url: &str,
        max: usize,
    ) -> Result<Vec<LinkCandidate>, ScrapeError> {
        let prompt = Self::prompt(page_text, base_url, max);
        let content = self.ask_with_backoff(&prompt).await.map_err(|reason| {
            ScrapeError::LinkExtraction {
                url: base_url.to_string(),
                reason,
            }
        })?;

        let candidates = parse_link_response(&content, max);
        if candidates.is_empty() {
            debug!(
                response_preview = %truncate_for_log(&content, 300),
                "Collaborator response yielded no candidates"
            );
        } else {
            info!(count = candidates.len(), "AI-assisted extraction found candidates");
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bare_json_array() {
        let content = r#"[{"title": "Post A", "url": "https://co.com/blog/a"},
                          {"title": "Post B", "url": "https://co.com/blog/b"}]"#;
        let candidates = parse_link_response(content, 5);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Post A");
    }

    #[test]
    fn test_parses_fenced_json() {
        let content = "Here are the articles:\n```json\n[{\"title\": \"Post A\", \"url\": \"https://co.com/blog/a\"}]\n```";
        let candidates = parse_link_response(content, 5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://co.com/blog/a");
    }

    #[test]
    fn test_line_pattern_fallback() {
        let content = "Title: Post A\nURL: https://co.com/blog/a\n\nTitle: Post B\nURL: https://co.com/blog/b\n";
        let candidates = parse_link_response(content, 5);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].url, "https://co.com/blog/b");
    }

    #[test]
    fn test_max_is_enforced() {
        let content = "Title: A\nURL: https://co.com/blog/a\nTitle: B\nURL: https://co.com/blog/b\n";
        assert_eq!(parse_link_response(content, 1).len(), 1);
    }

    #[test]
    fn test_relative_urls_rejected() {
        let content = r#"[{"title": "Post A", "url": "/blog/a"}]"#;
        assert!(parse_link_response(content, 5).is_empty());
    }

    #[test]
    fn test_garbage_degrades_to_empty() {
        assert!(parse_link_response("no structured data here", 5).is_empty());
    }

    #[test]
    fn test_html_to_text_keeps_link_targets_visible() {
        let text = html_to_text("<html><body><h2><a href=\"/blog/a\">Post A</a></h2></body></html>");
        assert!(text.contains("Post A"));
    }
}
