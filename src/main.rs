use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;

use sift::config::Config;
use sift::feed::{parse_and_normalize, Feed};
use sift::fetch::{fetch_feed, validate_source_url};

/// Maximum number of sources fetched simultaneously.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Get the config file path (~/.config/sift/config.toml)
fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("sift")
            .join("config.toml"),
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "sift",
    about = "Normalize RSS/Atom feeds into one canonical JSON schema"
)]
struct Args {
    /// Feed sources: http(s) URLs or local file paths
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<String>,

    /// Include unabridged bodies and non-standard fields in the output
    #[arg(long)]
    full_content: bool,

    /// Keep entry publish dates verbatim instead of converting to ISO-8601
    #[arg(long)]
    raw_dates: bool,

    /// Maximum character length of entry descriptions
    #[arg(long, value_name = "N")]
    max_description: Option<usize>,

    /// Path to a TOML config file (defaults to ~/.config/sift/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => Config::load(&path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring unreadable default config");
                Config::default()
            }),
            None => Config::default(),
        },
    };

    // Command-line flags override the file.
    if args.full_content {
        config.reader.include_full_content = true;
    }
    if args.raw_dates {
        config.reader.convert_pubdate_to_iso = false;
    }
    if let Some(max_len) = args.max_description {
        config.reader.description_max_len = max_len;
    }
    Ok(config)
}

async fn read_source(client: &reqwest::Client, config: &Config, source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        validate_source_url(source)
            .with_context(|| format!("Refusing to fetch {source}"))?;
        let fetched = fetch_feed(client, source, &config.fetch)
            .await
            .with_context(|| format!("Failed to fetch {source}"))?;
        tracing::debug!(
            source = %source,
            status = fetched.status,
            content_type = fetched.content_type.as_deref().unwrap_or("-"),
            "Fetched feed"
        );
        Ok(fetched.body)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read {source}"))
    }
}

async fn process_source(client: &reqwest::Client, config: &Config, source: &str) -> Result<Feed> {
    let text = read_source(client, config, source).await?;
    parse_and_normalize(&text, &config.parser, &config.reader)
        .with_context(|| format!("Failed to normalize {source}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let client = reqwest::Client::new();
    let results: Vec<(String, Result<Feed>)> = stream::iter(args.sources.iter())
        .map(|source| {
            let client = client.clone();
            let config = config.clone();
            async move {
                let result = process_source(&client, &config, source).await;
                (source.clone(), result)
            }
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    let mut failures = 0usize;
    for (source, result) in results {
        match result {
            Ok(feed) => {
                let json = if args.pretty {
                    serde_json::to_string_pretty(&feed)
                } else {
                    serde_json::to_string(&feed)
                }
                .context("Failed to serialize feed")?;
                println!("{json}");
            }
            Err(e) => {
                failures += 1;
                tracing::error!(source = %source, error = %e, "Normalization failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} sources failed", args.sources.len());
    }
    Ok(())
}
