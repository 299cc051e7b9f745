//! Command-line interface definitions for blogwatch.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via environment variables instead of flags.

use clap::Parser;

/// Command-line arguments for the blogwatch application.
///
/// # Examples
///
/// ```sh
/// # Extract up to 5 articles from each URL listed in sources.txt
/// blogwatch -s sources.txt
///
/// # Custom per-source cap, config file, and output path
/// blogwatch -s sources.txt -n 10 -c config.yaml -o articles.json
///
/// # Enable the AI link-discovery fallback
/// blogwatch -s sources.txt --api-key sk-...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a file listing source URLs, one per line (`#` comments allowed)
    #[arg(short, long)]
    pub sources: String,

    /// Maximum number of articles to extract per source
    #[arg(short = 'n', long, default_value_t = 5)]
    pub max_articles: usize,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output path for the JSON result ("-" writes to stdout)
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// API key for the AI link-discovery fallback (optional)
    #[arg(long, env = "OPENAI_API_KEY")]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(&[
            "blogwatch",
            "--sources",
            "sources.txt",
            "--max-articles",
            "10",
        ]);

        assert_eq!(cli.sources, "sources.txt");
        assert_eq!(cli.max_articles, 10);
        assert_eq!(cli.output, "-");
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(&[
            "blogwatch",
            "-s",
            "/tmp/sources.txt",
            "-n",
            "3",
            "-o",
            "/tmp/out.json",
        ]);

        assert_eq!(cli.sources, "/tmp/sources.txt");
        assert_eq!(cli.max_articles, 3);
        assert_eq!(cli.output, "/tmp/out.json");
    }
}
