//! Article extraction from the news hub.
//!
//! Extraction runs in tiers, each one only when the previous came up empty:
//!
//! 1. **Hub fetch**: download the hub page. If every attempt fails, the
//!    built-in [`FALLBACK_HTML`] is scraped instead so the run always has
//!    input.
//! 2. **Container cascade** ([`cascade`]): ordered container selectors,
//!    each container read through ordered field chains.
//! 3. **Direct links** ([`links`]): fetch topic-matching hyperlinks one by
//!    one and read each article page.
//!
//! The last resort, placeholder entries, belongs to the feed builder
//! ([`crate::outputs::feed`]).
//!
//! Nothing in here returns an error: a selector miss, a bad date or a dead
//! link only narrows what ends up in the feed.

pub mod cascade;
pub mod links;
pub mod lookup;

use crate::config::{FeedConfig, SiteProfile};
use crate::document::Document;
use crate::fetch::{FetchResult, Fetcher, PageSource};
use crate::models::ArticleRecord;
use cascade::Cascade;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

/// Page scraped when the hub cannot be fetched: one sample article.
pub const FALLBACK_HTML: &str = r#"
<html><body>
    <div class="PageList-items-item">
        <div class="PagePromo-content">
            <a class="PagePromo-title">Sample Financial Markets Headline</a>
            <div class="PagePromo-description">This is a sample description for demonstration.</div>
        </div>
    </div>
</body></html>
"#;

/// Fetch the hub and extract up to `config.max_articles` articles.
///
/// # Returns
///
/// Articles in discovery order. Empty only when both the cascade and the
/// direct-link scan found nothing.
#[instrument(level = "info", skip_all, fields(hub_url = %profile.hub_url))]
pub async fn collect_articles<S: PageSource>(
    fetcher: &mut Fetcher<S>,
    profile: &SiteProfile,
    config: &FeedConfig,
    fetched_at: DateTime<Utc>,
) -> Vec<ArticleRecord> {
    let body = match fetcher.fetch(&profile.hub_url).await {
        FetchResult::Html(page) => page.body,
        FetchResult::Failure { reason } => {
            warn!(%reason, "Could not fetch hub; using built-in sample page");
            FALLBACK_HTML.to_string()
        }
    };

    let mut cascade = Cascade::new(profile, fetched_at, config.max_articles);
    let links = {
        let doc = Document::parse(&body);
        cascade.scan_containers(&doc);
        if cascade.is_empty() {
            links::topic_links(&doc, profile, config.link_scan_limit)
        } else {
            Vec::new()
        }
    };

    if cascade.is_empty() {
        info!(candidates = links.len(), "No containers matched; scanning article links");
        links::scan_article_pages(&mut cascade, fetcher, profile, &links).await;
    }

    info!(count = cascade.len(), "Extraction complete");
    cascade.into_records()
}
