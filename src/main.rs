//! Sumi-Sieve main entry point
//!
//! This is the command-line interface for the Sumi-Sieve crawler and
//! markup extractor.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sumi_sieve::config::{load_config, validate, Config};
use sumi_sieve::crawler::{Crawler, Fetcher, HttpFetcher};
use sumi_sieve::output::{write_list, ExportFormat};
use sumi_sieve::selector::{attribute_value, extract, fragment_text, Selector};
use tracing_subscriber::EnvFilter;

/// Sumi-Sieve: a concurrent crawler and markup sieve
///
/// Crawls websites breadth-first with a pool of workers, and extracts
/// fragments from markup with tag, CSS-like or XPath-like selectors.
#[derive(Parser, Debug)]
#[command(name = "sumi-sieve")]
#[command(version)]
#[command(about = "A concurrent crawler and markup sieve", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl breadth-first from a seed URL and list the pages fetched
    Crawl {
        /// Seed URL
        url: String,

        /// Maximum link depth from the seed (overrides config)
        #[arg(long)]
        max_depth: Option<u32>,

        /// Number of concurrent workers (overrides config)
        #[arg(long)]
        workers: Option<u32>,

        /// Write the crawled URLs to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output file format (overrides config)
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
    },

    /// Extract fragments matching a selector from a URL or local file
    Extract {
        /// http(s) URL or path to a markup file
        source: String,

        /// Selector: `<tag>`, `//tag[@attr="value"]` or CSS-like (`.cls p`)
        selector: String,

        /// Print the value of this attribute instead of the fragment
        #[arg(long, value_name = "NAME", conflicts_with = "text")]
        attr: Option<String>,

        /// Print the text content instead of the fragment
        #[arg(long)]
        text: bool,

        /// Write the results to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Crawl {
            url,
            max_depth,
            workers,
            output,
            format,
        } => {
            let mut config = config;
            if let Some(max_depth) = max_depth {
                config.crawler.max_depth = max_depth;
            }
            if let Some(workers) = workers {
                config.crawler.workers = workers;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            validate(&config).context("Invalid crawl options")?;
            handle_crawl(&config, &url, output.as_deref()).await
        }
        Command::Extract {
            source,
            selector,
            attr,
            text,
            output,
        } => {
            let projection = match attr {
                Some(name) => Projection::Attribute(name),
                None if text => Projection::Text,
                None => Projection::Fragment,
            };
            handle_extract(&config, &source, &selector, projection, output.as_deref()).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sieve=info,warn"),
            1 => EnvFilter::new("sumi_sieve=debug,info"),
            2 => EnvFilter::new("sumi_sieve=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Results go to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawl subcommand
async fn handle_crawl(config: &Config, seed: &str, output: Option<&Path>) -> Result<()> {
    url::Url::parse(seed).with_context(|| format!("Invalid seed URL: {}", seed))?;

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let crawler = Crawler::new(fetcher, config.crawler.clone());

    // Ctrl-C stops the crawl and keeps what has been fetched so far
    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            stop.stop();
        }
    });

    let result = crawler.run(seed).await;

    for failure in &result.failed {
        tracing::debug!("Failed: {} (depth {}): {}", failure.url, failure.depth, failure.error);
    }
    if !result.failed.is_empty() {
        tracing::warn!("{} pages could not be fetched", result.failed.len());
    }

    emit(result.urls(), "url", output, config.output.format)
}

/// What to print for each extracted fragment
enum Projection {
    Fragment,
    Text,
    Attribute(String),
}

/// Handles the extract subcommand
async fn handle_extract(
    config: &Config,
    source: &str,
    selector: &str,
    projection: Projection,
    output: Option<&Path>,
) -> Result<()> {
    if Selector::parse(selector).is_none() {
        tracing::warn!("Selector {:?} is not valid and will match nothing", selector);
    }

    let markup = if source.starts_with("http://") || source.starts_with("https://") {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        fetcher.fetch_text(source).await?
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?
    };

    let fragments = extract(&markup, selector);
    tracing::info!("{} fragments matched {}", fragments.len(), selector);

    let column = match &projection {
        Projection::Fragment => "fragment".to_string(),
        Projection::Text => "text".to_string(),
        Projection::Attribute(name) => name.clone(),
    };

    let results: Vec<String> = match projection {
        Projection::Fragment => fragments.into_iter().map(str::to_string).collect(),
        Projection::Text => fragments.into_iter().map(fragment_text).collect(),
        Projection::Attribute(name) => fragments
            .into_iter()
            .filter_map(|f| attribute_value(f, &name))
            .collect(),
    };

    emit(&results, &column, output, config.output.format)
}

/// Writes results to `output`, or prints them one per line
///
/// `column` heads the single CSV column when the format is csv.
fn emit(items: &[String], column: &str, output: Option<&Path>, format: ExportFormat) -> Result<()> {
    match output {
        Some(path) => {
            write_list(path, column, items, format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} entries to {}", items.len(), path.display());
        }
        None => {
            for item in items {
                println!("{}", item);
            }
        }
    }
    Ok(())
}
