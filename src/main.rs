//! # Blogwatch
//!
//! Command-line front end for the blogwatch extraction engine. Reads a
//! list of source URLs from a file, runs the full acquisition pipeline
//! (feed parsing, link discovery, article extraction, AI fallback), and
//! writes the deduplicated result as JSON.
//!
//! ## Usage
//!
//! ```sh
//! blogwatch -s sources.txt -n 5 -o articles.json
//! ```

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use blogwatch::models::SourceRequest;
use blogwatch::{Engine, OpenAiLinkExtractor, Settings};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("blogwatch starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.sources, ?args.max_articles, ?args.output, "Parsed CLI arguments");

    // --- Load settings ---
    let settings = Settings::load(args.config.as_deref().map(Path::new))?;
    info!(
        config = %args.config.as_deref().unwrap_or("<defaults>"),
        request_delay_seconds = settings.request_delay_seconds,
        max_concurrent_requests = settings.max_concurrent_requests,
        "Settings loaded"
    );

    // --- Read source list ---
    let contents = tokio::fs::read_to_string(&args.sources).await?;
    let mut sources = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        sources.push(SourceRequest::new(line, args.max_articles)?);
    }
    if sources.is_empty() {
        return Err(format!("no source URLs found in {}", args.sources).into());
    }
    info!(count = sources.len(), "Loaded source URLs");

    // --- Build engine ---
    let api_base_url = settings.api_base_url.clone();
    let api_model = settings.api_model.clone();
    let mut engine = Engine::new(settings)?;
    if let Some(api_key) = args.api_key {
        info!(model = %api_model, base_url = %api_base_url, "AI link-discovery fallback enabled");
        engine = engine.with_link_extractor(Arc::new(OpenAiLinkExtractor::new(
            api_base_url,
            api_key,
            api_model,
        )));
    } else {
        info!("No API key provided; AI link-discovery fallback disabled");
    }

    // --- Run extraction ---
    let result = engine.extract_articles(&sources).await;
    info!(
        articles = result.articles.len(),
        errors = result.errors.len(),
        "Extraction completed"
    );

    // --- Write output ---
    let json = serde_json::to_string_pretty(&result)?;
    if args.output == "-" {
        println!("{json}");
    } else {
        tokio::fs::write(&args.output, &json).await?;
        info!(path = %args.output, "Wrote JSON result");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
