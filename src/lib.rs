//! # Blogwatch
//!
//! A resilient content acquisition and article extraction engine. Given a
//! list of source URLs — syndication feeds, blog index pages, or direct
//! article links — it produces a deduplicated collection of structured
//! articles with per-source failure isolation.
//!
//! ## Pipeline
//!
//! 1. **Classification** ([`classify`]): each source URL is routed as a
//!    feed, a specific article, or a blog index.
//! 2. **Fetching** ([`fetch`]): an HTTP client with rotating user agents,
//!    per-host concurrency limits, and a subprocess `curl` fallback for
//!    hosts that reject programmatic clients.
//! 3. **Extraction** ([`feed`], [`article`], [`discover`]): feed entries
//!    are parsed directly; index pages go through CSS-selector link
//!    discovery followed by per-article heuristic extraction.
//! 4. **AI fallback** ([`ai_extract`]): when selector-based discovery
//!    finds nothing, an OpenAI-compatible chat endpoint is asked to pull
//!    article links out of the page text.
//! 5. **Aggregation** ([`engine`]): results from all sources are merged,
//!    deduplicated by URL, and returned alongside per-source errors.
//!
//! ## Example
//!
//! ```no_run
//! use blogwatch::{Engine, Settings, SourceRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(Settings::default())?;
//! let sources = vec![SourceRequest::new("https://blog.example.com", 5)?];
//! let result = engine.extract_articles(&sources).await;
//! println!("{} articles, {} errors", result.articles.len(), result.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod ai_extract;
pub mod article;
pub mod cache;
pub mod classify;
pub mod dates;
pub mod discover;
pub mod engine;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod models;
pub mod settings;
pub mod utils;

pub use ai_extract::{LinkCandidate, LinkExtractor, OpenAiLinkExtractor};
pub use engine::Engine;
pub use error::ScrapeError;
pub use models::{ArticleDraft, ExtractionBatchResult, SourceRequest};
pub use settings::Settings;
