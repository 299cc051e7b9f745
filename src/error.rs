//! Error types for the extraction engine.
//!
//! Failures affecting a single source or article are caught at the
//! narrowest scope and converted into per-source error strings on the
//! batch result; nothing here ever aborts a whole batch. The only
//! errors surfaced to callers before I/O begins are contract
//! violations (bad configuration, out-of-range bounds).

use thiserror::Error;

/// Errors produced while acquiring or extracting content.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Both the primary HTTP client and the external fallback failed
    /// (or under-returned) for a URL.
    #[error("failed to fetch {url}: both primary and fallback strategies failed")]
    Unreachable { url: String },

    /// The feed document could not be parsed.
    #[error("failed to parse feed at {url}: {reason}")]
    FeedParse { url: String, reason: String },

    /// An article page was fetched but no content block or title could
    /// be located at all.
    #[error("no article content extracted from {url}")]
    EmptyExtraction { url: String },

    /// The AI-assisted link-extraction collaborator failed or returned
    /// an unusable response.
    #[error("link extraction failed for {url}: {reason}")]
    LinkExtraction { url: String, reason: String },

    /// A source URL did not parse as an absolute http(s) URL.
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    /// A caller-supplied bound or configuration value is outside its
    /// documented range. Raised before any I/O begins.
    #[error("invalid configuration: {0}")]
    InvalidSettings(String),

    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_reference_the_url() {
        let e = ScrapeError::Unreachable {
            url: "https://bad.example/timeout".to_string(),
        };
        assert!(e.to_string().contains("https://bad.example/timeout"));

        let e = ScrapeError::FeedParse {
            url: "https://co.com/feed".to_string(),
            reason: "not xml".to_string(),
        };
        assert!(e.to_string().contains("https://co.com/feed"));
        assert!(e.to_string().contains("not xml"));
    }
}
