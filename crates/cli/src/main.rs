//! webrace command-line front-end.
//!
//! Runs one scrape request and prints the JSON result on stdout. Logs go to
//! stderr so the output can be piped.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use webrace_client::{Scraper, SessionOptions};
use webrace_core::{AppConfig, CrawlMode, FetchMode};

/// Webrace: race fetch strategies and score pages against a query
#[derive(Parser, Debug)]
#[command(name = "webrace")]
#[command(version)]
#[command(about = "Scrape pages by racing fetch strategies", long_about = None)]
struct Cli {
    /// URLs to scrape
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Text to score each page against
    #[arg(short, long, default_value = "")]
    query: String,

    /// Include up to five content image URLs per page
    #[arg(long)]
    images: bool,

    /// Fetch mode (defaults to the configured mode)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Score the seed page only, or every internal link
    #[arg(long, value_enum)]
    crawl: Option<CrawlArg>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Race,
    Tiered,
    Browser,
}

impl From<ModeArg> for FetchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Race => FetchMode::Race,
            ModeArg::Tiered => FetchMode::Tiered,
            ModeArg::Browser => FetchMode::Browser,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CrawlArg {
    Single,
    Links,
}

impl From<CrawlArg> for CrawlMode {
    fn from(arg: CrawlArg) -> Self {
        match arg {
            CrawlArg::Single => CrawlMode::Single,
            CrawlArg::Links => CrawlMode::Links,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if cli.mode == Some(ModeArg::Browser) {
        config.render_enabled = true;
    }

    let scraper = Scraper::from_config(&config).context("failed to initialise fetch strategies")?;
    let opts = SessionOptions {
        query: cli.query,
        include_images: cli.images,
        mode: cli.mode.map(FetchMode::from),
        crawl: cli.crawl.map(CrawlMode::from),
    };

    tracing::info!("scraping {} url(s)", cli.urls.len());
    let results = scraper.scrape_all(&cli.urls, &opts).await;
    scraper.shutdown();
    let failed = results.iter().filter(|r| !r.is_success()).count();

    let output = serde_json::to_string_pretty(&json!({ "results": results }))?;
    println!("{output}");

    if failed == results.len() {
        anyhow::bail!("no content retrieved for any url");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("webrace_client=warn,webrace_core=warn,error"),
        1 => EnvFilter::new("webrace_client=info,webrace_core=info,warn"),
        2 => EnvFilter::new("webrace_client=debug,webrace_core=debug,info"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["webrace", "https://example.com"]).unwrap();
        assert_eq!(cli.urls, vec!["https://example.com"]);
        assert_eq!(cli.query, "");
        assert!(!cli.images);
        assert!(cli.mode.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_modes() {
        let cli = Cli::try_parse_from(["webrace", "a", "b", "--mode", "tiered", "--crawl", "links", "-vv"]).unwrap();
        assert_eq!(cli.urls.len(), 2);
        assert_eq!(cli.mode.map(FetchMode::from), Some(FetchMode::Tiered));
        assert_eq!(cli.crawl.map(CrawlMode::from), Some(CrawlMode::Links));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_url_required() {
        assert!(Cli::try_parse_from(["webrace"]).is_err());
    }
}
