//! Engine configuration with YAML file loading and validated defaults.
//!
//! Settings mirror the politeness and resilience knobs of the fetch
//! pipeline: inter-source delay, per-host connection cap, timeouts,
//! the user-agent pool, proxy credentials, and the advisory cache TTL.
//! Values come from an optional YAML file; every field has a default so
//! the engine runs unconfigured. Out-of-range values are rejected at
//! load time, before any I/O begins.

use crate::error::ScrapeError;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Proxy credentials for the external fetch tool.
///
/// When `enabled` is false (or no URL is set) the tool falls back to
/// the `HTTP_PROXY`/`HTTPS_PROXY` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pause between sources in a batch, in seconds (0.1–10).
    pub request_delay_seconds: f64,
    /// Bound on concurrently fetched article pages within one source.
    pub max_concurrent_requests: usize,
    /// Simultaneous connections allowed per host.
    pub max_concurrent_requests_per_host: usize,
    /// Total-request timeout for the primary HTTP client, in seconds.
    pub request_timeout_seconds: u64,
    /// User-agent pool; one is picked at random per primary request.
    pub user_agents: Vec<String>,
    pub proxy: ProxySettings,
    /// TTL for the advisory URL content cache.
    pub cache_ttl_minutes: u64,
    pub cache_max_entries: usize,
    /// Minimum body length for a fetch to count as a success.
    pub min_content_bytes: usize,
    /// OpenAI-compatible endpoint for the link-extraction fallback.
    pub api_base_url: String,
    pub api_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_delay_seconds: 2.0,
            max_concurrent_requests: 5,
            max_concurrent_requests_per_host: 2,
            request_timeout_seconds: 30,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            ],
            proxy: ProxySettings::default(),
            cache_ttl_minutes: 360,
            cache_max_entries: 512,
            min_content_bytes: 100,
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_model: "gpt-4-turbo-preview".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, or defaults when `path` is
    /// `None`. Validation runs in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self, ScrapeError> {
        let settings = match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p)?;
                let settings: Settings = serde_yaml::from_str(&contents)?;
                info!(path = %p.display(), "Loaded settings file");
                settings
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject out-of-range values before any I/O begins.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if !(0.1..=10.0).contains(&self.request_delay_seconds) {
            return Err(ScrapeError::InvalidSettings(format!(
                "request_delay_seconds must be between 0.1 and 10, got {}",
                self.request_delay_seconds
            )));
        }
        if self.max_concurrent_requests_per_host == 0 {
            return Err(ScrapeError::InvalidSettings(
                "max_concurrent_requests_per_host must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ScrapeError::InvalidSettings(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.user_agents.is_empty() {
            return Err(ScrapeError::InvalidSettings(
                "user_agents pool must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
