//! Data models produced and consumed by the pipeline.
//!
//! - [`ArticleRecord`]: a normalized article, ready for the feed
//! - [`Channel`]: feed-level metadata
//! - [`FeedDocument`]: the channel plus its ordered items for one run
//!
//! Nothing here outlives a run; there is no cross-run state.

use chrono::{DateTime, Utc};

/// A normalized article.
///
/// `title` and `description` are never empty and `url` is always absolute;
/// the normalizer supplies defaults for anything the page did not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Parsed publication time, or the fetch time when unknown.
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

/// Feed-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    /// The hub URL the feed was scraped from.
    pub link: String,
    pub description: String,
}

/// One generated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub channel: Channel,
    pub built_at: DateTime<Utc>,
    /// Items in discovery order.
    pub items: Vec<ArticleRecord>,
}
