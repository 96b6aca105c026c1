//! Command-line interface definitions for Markets Feed.
//!
//! All arguments can be provided via command-line flags or environment
//! variables. Defaults reproduce the classic behaviour: ten articles at
//! most, five placeholders when nothing is found, three attempts per URL.

use crate::config::FeedConfig;
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the Markets Feed application.
///
/// # Examples
///
/// ```sh
/// # Write ./markets.xml from the AP News markets hub
/// markets_feed
///
/// # Custom output path and a site profile
/// markets_feed -o /var/www/feeds/markets.xml -p profiles/apnews.yaml
///
/// # Fail fast while debugging
/// RUST_LOG=debug markets_feed --max-attempts 1 --backoff-max-ms 0
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the RSS file to write (replaced on every run)
    #[arg(short, long, env = "MARKETS_FEED_OUTPUT", default_value = "markets.xml")]
    pub output: PathBuf,

    /// Optional YAML site profile overriding selectors and channel metadata
    #[arg(short, long, env = "MARKETS_FEED_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Scrape this hub instead of the profile's
    #[arg(long, env = "MARKETS_FEED_HUB_URL")]
    pub hub_url: Option<String>,

    /// GET attempts per URL, including the first
    #[arg(long, env = "MARKETS_FEED_MAX_ATTEMPTS", default_value_t = 3, value_parser = at_least_one())]
    pub max_attempts: usize,

    /// Maximum number of items in the feed
    #[arg(long, env = "MARKETS_FEED_MAX_ARTICLES", default_value_t = 10, value_parser = at_least_one())]
    pub max_articles: usize,

    /// Placeholder items emitted when no article could be extracted
    #[arg(long, env = "MARKETS_FEED_PLACEHOLDER_COUNT", default_value_t = 5, value_parser = at_least_one())]
    pub placeholder_count: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "MARKETS_FEED_TIMEOUT_SECS", default_value_t = 20)]
    pub timeout_secs: u64,

    /// Lower bound of the randomized delay before a retry
    #[arg(long, default_value_t = 1000)]
    pub backoff_min_ms: u64,

    /// Upper bound of the randomized delay before a retry (0 disables)
    #[arg(long, default_value_t = 3000)]
    pub backoff_max_ms: u64,

    /// Most article pages fetched when falling back to link scanning
    #[arg(long, default_value_t = 25)]
    pub link_scan_limit: usize,
}

/// Counts that must be positive: attempts, the item cap and the
/// placeholder floor.
fn at_least_one() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

impl Cli {
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            max_articles: self.max_articles,
            placeholder_count: self.placeholder_count,
            max_attempts: self.max_attempts,
            request_timeout: Duration::from_secs(self.timeout_secs),
            backoff_min: Duration::from_millis(self.backoff_min_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
            link_scan_limit: self.link_scan_limit,
        }
    }
}
