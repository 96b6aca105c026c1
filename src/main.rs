//! # Markets Feed
//!
//! Scrapes the AP News financial-markets hub and publishes the stories it
//! finds as an RSS 2.0 feed with Media RSS image extensions.
//!
//! ## Usage
//!
//! ```sh
//! markets_feed -o ./markets.xml
//! ```
//!
//! ## Architecture
//!
//! The run is a single sequential pipeline:
//! 1. **Fetching**: download the hub with retries, backoff and user-agent
//!    rotation; fall back to a built-in sample page if it stays unreachable
//! 2. **Extraction**: container selector cascade, then per-article link
//!    scanning if the cascade found nothing
//! 3. **Assembly**: channel metadata plus at most ten items, or five
//!    placeholders when extraction came up empty
//! 4. **Output**: render RSS XML and replace the output file
//!
//! Only a failed write (or an unreadable profile) ends the run with a
//! non-zero exit; remote failures always degrade to some feed.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod document;
mod errors;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::{FeedConfig, SiteProfile};
use errors::WriteError;
use fetch::{Fetcher, HttpPageSource, PageSource};
use outputs::{feed, rss};

#[tokio::main]
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
    info!("markets_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut profile = match &args.profile {
        Some(path) => SiteProfile::load(path)?,
        None => SiteProfile::default(),
    };
    if let Some(hub_url) = &args.hub_url {
        profile.hub_url = hub_url.clone();
    }
    let config = args.feed_config();

    let source = HttpPageSource::new(config.request_timeout)?;
    let referer = format!("{}/", profile.site_root.trim_end_matches('/'));
    let mut fetcher = Fetcher::new(source, &referer, config.max_attempts)
        .with_backoff(config.backoff_min, config.backoff_max);
    debug!(user_agent = %fetcher.user_agent(), "Initial user agent");

    let count = match run(&mut fetcher, &profile, &config, &args.output).await {
        Ok(count) => count,
        Err(e) => {
            error!(path = %args.output.display(), error = %e, "Could not write feed");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = count,
        path = %args.output.display(),
        "RSS feed created"
    );
    Ok(())
}

/// One full run: extract, assemble and write. Returns the item count.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
async fn run<S: PageSource>(
    fetcher: &mut Fetcher<S>,
    profile: &SiteProfile,
    config: &FeedConfig,
    output: &Path,
) -> Result<usize, WriteError> {
    let fetched_at = Utc::now();
    let records = scrapers::collect_articles(fetcher, profile, config, fetched_at).await;
    let document = feed::build_feed(profile, records, config, Utc::now());
    rss::write_feed(&document, output).await?;
    Ok(document.items.len())
}
