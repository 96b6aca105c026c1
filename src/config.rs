//! Site profile and run limits.
//!
//! A [`SiteProfile`] describes *where* to look: channel metadata, the hub
//! URL, and the ordered selector chains tried by the cascade. The built-in
//! default targets the AP News financial-markets hub. A YAML file can
//! override any subset of fields; everything it leaves out keeps the
//! default.
//!
//! [`FeedConfig`] carries the numeric knobs of a run (article cap,
//! placeholder count, retry policy) and is built from the CLI.

use crate::errors::ProfileError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// One step of a selector chain: a CSS selector plus what to read from the
/// matched element.
///
/// In YAML a lookup is either a bare selector string (read the element's
/// text) or a map with `selector` and `attr`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawLookup")]
pub struct Lookup {
    pub selector: String,
    /// Attribute to read instead of the trimmed text.
    pub attr: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLookup {
    Selector(String),
    Full {
        selector: String,
        #[serde(default)]
        attr: Option<String>,
    },
}

impl From<RawLookup> for Lookup {
    fn from(raw: RawLookup) -> Self {
        match raw {
            RawLookup::Selector(selector) => Lookup { selector, attr: None },
            RawLookup::Full { selector, attr } => Lookup { selector, attr },
        }
    }
}

impl Lookup {
    pub fn text(selector: &str) -> Self {
        Lookup {
            selector: selector.to_string(),
            attr: None,
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Lookup {
            selector: selector.to_string(),
            attr: Some(attr.to_string()),
        }
    }
}

fn texts(selectors: &[&str]) -> Vec<Lookup> {
    selectors.iter().map(|s| Lookup::text(s)).collect()
}

/// Everything the scraper needs to know about one news hub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Channel title written to the feed.
    pub title: String,
    /// Channel description written to the feed.
    pub description: String,
    /// The hub page that is scraped; also the channel link.
    pub hub_url: String,
    /// Origin used to absolutise relative links and image sources.
    pub site_root: String,

    /// Title used when a headline link has no visible text.
    pub untitled_label: String,
    /// Prefix of the generated description; the title is appended.
    pub description_prefix: String,
    /// Placeholder titles are this label followed by ` 1..N`.
    pub placeholder_label: String,
    pub placeholder_description: String,

    /// Candidate article wrappers, most specific first.
    pub containers: Vec<String>,
    pub headline_links: Vec<Lookup>,
    pub descriptions: Vec<Lookup>,
    pub timestamps: Vec<Lookup>,
    pub images: Vec<Lookup>,

    /// Path substrings that make a bare hyperlink worth fetching when the
    /// container cascade comes up empty.
    pub topic_paths: Vec<String>,
    pub article_headlines: Vec<Lookup>,
    pub article_bodies: Vec<Lookup>,
    pub article_timestamps: Vec<Lookup>,
    pub article_images: Vec<Lookup>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        SiteProfile {
            title: "AP News Financial Markets".to_string(),
            description: "Latest news on Financial Markets from AP News".to_string(),
            hub_url: "https://apnews.com/hub/financial-markets".to_string(),
            site_root: "https://apnews.com".to_string(),

            untitled_label: "Financial Markets Update".to_string(),
            description_prefix: "AP News financial markets article: ".to_string(),
            placeholder_label: "Financial Markets Update".to_string(),
            placeholder_description: "Latest financial markets news and updates.".to_string(),

            containers: vec![
                r#"div[data-key="feed-card-wire-story-with-thumbnail"]"#.to_string(),
                "div.PagePromo".to_string(),
                "div.PageList-items-item".to_string(),
                "div.CardHeadline".to_string(),
            ],
            headline_links: texts(&[
                "a.PagePromo-title",
                ".PagePromo-title a",
                "a.CardHeadline-title",
                r#"a[data-key="card-headline"]"#,
                "a",
            ]),
            descriptions: texts(&[
                "div.PagePromo-description",
                ".PagePromo-description",
                "p.CardHeadline-description",
                "div.content p",
            ]),
            timestamps: vec![
                Lookup::attr("bsp-timestamp[data-timestamp]", "data-timestamp"),
                Lookup::attr("time[datetime]", "datetime"),
                Lookup::text(".PagePromo-date"),
                Lookup::text("span.Timestamp"),
            ],
            images: vec![
                Lookup::attr("img.Image", "src"),
                Lookup::attr("picture img", "src"),
                Lookup::attr("img[src]", "src"),
                Lookup::attr("img[data-src]", "data-src"),
            ],

            topic_paths: vec![
                "/article/".to_string(),
                "market".to_string(),
                "stock".to_string(),
                "econom".to_string(),
                "financ".to_string(),
            ],
            article_headlines: vec![
                Lookup::text("h1.Page-headline"),
                Lookup::text("h1"),
                Lookup::attr(r#"meta[property="og:title"]"#, "content"),
            ],
            article_bodies: vec![
                Lookup::text("div.RichTextStoryBody p"),
                Lookup::text("article p"),
                Lookup::attr(r#"meta[name="description"]"#, "content"),
                Lookup::text("p"),
            ],
            article_timestamps: vec![
                Lookup::attr(r#"meta[property="article:published_time"]"#, "content"),
                Lookup::attr("bsp-timestamp[data-timestamp]", "data-timestamp"),
                Lookup::attr("time[datetime]", "datetime"),
            ],
            article_images: vec![
                Lookup::attr(r#"meta[property="og:image"]"#, "content"),
                Lookup::attr("figure img", "src"),
            ],
        }
    }
}

impl SiteProfile {
    /// Load a profile from YAML, filling omitted fields from the default.
    #[instrument(level = "info", fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let profile = Self::from_yaml(&raw).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(hub_url = %profile.hub_url, "Loaded site profile");
        Ok(profile)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}

/// Numeric limits of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Hard cap on feed items.
    pub max_articles: usize,
    /// Number of synthetic entries emitted when nothing was extracted.
    pub placeholder_count: usize,
    /// GET attempts per URL, including the first.
    pub max_attempts: usize,
    pub request_timeout: Duration,
    /// Bounds of the randomised delay before a retry.
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    /// Maximum number of article pages fetched by the direct-link tier.
    pub link_scan_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            max_articles: 10,
            placeholder_count: 5,
            max_attempts: 3,
            request_timeout: Duration::from_secs(20),
            backoff_min: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(3000),
            link_scan_limit: 25,
        }
    }
}
