//! Feed assembly.
//!
//! Wraps the extracted articles in channel metadata, enforces the item cap
//! and substitutes numbered placeholder entries when extraction produced
//! nothing, so the channel is never empty.

use crate::config::{FeedConfig, SiteProfile};
use crate::models::{ArticleRecord, Channel, FeedDocument};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Build the feed for one run.
///
/// # Arguments
///
/// * `profile` - Source of the channel metadata and placeholder wording
/// * `records` - Extracted articles in discovery order
/// * `config` - Item cap and placeholder count
/// * `built_at` - Channel build time, also the placeholders' publication time
pub fn build_feed(
    profile: &SiteProfile,
    mut records: Vec<ArticleRecord>,
    config: &FeedConfig,
    built_at: DateTime<Utc>,
) -> FeedDocument {
    let items = if records.is_empty() {
        let count = config.placeholder_count.min(config.max_articles);
        warn!(count, "No articles extracted; emitting placeholder entries");
        placeholder_records(profile, count, built_at)
    } else {
        records.truncate(config.max_articles);
        records
    };
    info!(items = items.len(), "Feed assembled");

    FeedDocument {
        channel: Channel {
            title: profile.title.clone(),
            link: profile.hub_url.clone(),
            description: profile.description.clone(),
        },
        built_at,
        items,
    }
}

/// `count` clearly labelled stand-in entries numbered from 1.
pub fn placeholder_records(
    profile: &SiteProfile,
    count: usize,
    at: DateTime<Utc>,
) -> Vec<ArticleRecord> {
    (1..=count)
        .map(|i| ArticleRecord {
            title: format!("{} {}", profile.placeholder_label, i),
            url: profile.hub_url.clone(),
            description: profile.placeholder_description.clone(),
            published_at: at,
            image_url: None,
        })
        .collect()
}
