//! Direct-link tier.
//!
//! Used only when the container cascade found nothing. Every on-site
//! hyperlink whose path mentions one of the profile's topics is fetched on
//! its own and read with the article-page chains (headline, body,
//! timestamp, image).

use crate::config::SiteProfile;
use crate::document::Document;
use crate::fetch::{FetchResult, Fetcher, PageSource};
use crate::normalize::{RawFields, resolve_url};
use crate::scrapers::cascade::Cascade;
use crate::scrapers::lookup::{first_image_source, first_value};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Absolute, on-site, topic-matching links of `doc` in document order,
/// without duplicates and capped at `limit`.
pub fn topic_links(doc: &Document, profile: &SiteProfile, limit: usize) -> Vec<String> {
    let Ok(root) = Url::parse(&profile.site_root) else {
        warn!(site_root = %profile.site_root, "Site root is not a valid URL; skipping link scan");
        return Vec::new();
    };
    let Some(host) = root.host_str().map(str::to_string) else {
        return Vec::new();
    };
    let hub = profile.hub_url.trim_end_matches('/');

    doc.select("a[href]")
        .into_iter()
        .filter_map(|a| a.attr("href"))
        .filter_map(|href| resolve_url(&root, href))
        .filter_map(|abs| {
            let url = Url::parse(&abs).ok()?;
            let on_site = url
                .host_str()
                .is_some_and(|h| h == host || h.ends_with(&format!(".{host}")));
            if !matches!(url.scheme(), "http" | "https") || !on_site {
                return None;
            }
            let path = url.path().to_ascii_lowercase();
            let topical = profile
                .topic_paths
                .iter()
                .any(|topic| path.contains(&topic.to_ascii_lowercase()));
            topical.then(|| {
                let mut clean = url;
                clean.set_fragment(None);
                clean.to_string()
            })
        })
        .filter(|link| link.trim_end_matches('/') != hub)
        .unique()
        .take(limit)
        .collect()
}

/// Read one article page. `None` when no headline can be found.
pub fn read_article_page(doc: &Document, url: &str, profile: &SiteProfile) -> Option<RawFields> {
    let root = doc.root();
    let title = first_value(&root, &profile.article_headlines)?;
    Some(RawFields {
        title,
        href: Some(url.to_string()),
        description: first_value(&root, &profile.article_bodies),
        timestamp: first_value(&root, &profile.article_timestamps),
        image: first_image_source(&root, &profile.article_images),
    })
}

/// Fetch each link in turn and offer its article to `cascade`.
///
/// Pages are fetched strictly one after another with the fetcher's retry
/// policy. Returns the number of articles accepted.
#[instrument(level = "info", skip_all, fields(links = links.len()))]
pub async fn scan_article_pages<S: PageSource>(
    cascade: &mut Cascade<'_>,
    fetcher: &mut Fetcher<S>,
    profile: &SiteProfile,
    links: &[String],
) -> usize {
    let before = cascade.len();

    for link in links {
        if cascade.is_full() {
            break;
        }
        let page = match fetcher.fetch(link).await {
            FetchResult::Html(page) => page,
            FetchResult::Failure { reason } => {
                warn!(url = %link, %reason, "Skipping article page");
                continue;
            }
        };

        let raw = {
            let doc = Document::parse(&page.body);
            read_article_page(&doc, &page.final_url, profile)
        };
        match raw {
            Some(raw) => {
                if cascade.accept(&raw) {
                    debug!(url = %page.final_url, "Accepted article page");
                }
            }
            None => warn!(
                url = %page.final_url,
                preview = %truncate_for_log(&page.body, 200),
                "Article page has no headline"
            ),
        }
    }

    let added = cascade.len() - before;
    info!(added, total = cascade.len(), "Direct-link scan finished");
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::fetch::tests::ScriptedSource;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    const HUB: &str = r##"
        <html><body>
            <nav>
                <a href="/hub/financial-markets">Markets hub</a>
                <a href="/sports">Sports</a>
                <a href="#top">Top</a>
                <a href="mailto:tips@apnews.com">Tips</a>
            </nav>
            <ul>
                <li><a href="/article/stocks-rally-1">Stocks rally</a></li>
                <li><a href="https://apnews.com/article/stocks-rally-1#comments">Comments</a></li>
                <li><a href="https://other.example.com/markets/x">Elsewhere</a></li>
                <li><a href="/business/Economy-Outlook">Economy</a></li>
                <li><a href="/article/bond-yields">Bonds</a></li>
            </ul>
        </body></html>
    "##;

    const ARTICLE: &str = r#"
        <html><head>
            <meta property="og:image" content="/img/rally.jpg">
            <meta property="article:published_time" content="2025-05-06T14:30:00Z">
        </head><body>
            <h1 class="Page-headline">Stocks rally to record</h1>
            <div class="RichTextStoryBody"><p>Wall Street closed higher.</p><p>More.</p></div>
        </body></html>
    "#;

    #[test]
    fn test_topic_links_filters_and_dedups() {
        let doc = Document::parse(HUB);
        let profile = SiteProfile::default();
        let links = topic_links(&doc, &profile, 10);
        assert_eq!(
            links,
            vec![
                "https://apnews.com/article/stocks-rally-1",
                "https://apnews.com/business/Economy-Outlook",
                "https://apnews.com/article/bond-yields",
            ]
        );
    }

    #[test]
    fn test_topic_links_respects_limit() {
        let doc = Document::parse(HUB);
        let links = topic_links(&doc, &SiteProfile::default(), 1);
        assert_eq!(links, vec!["https://apnews.com/article/stocks-rally-1"]);
    }

    #[test]
    fn test_read_article_page() {
        let doc = Document::parse(ARTICLE);
        let profile = SiteProfile::default();
        let raw = read_article_page(&doc, "https://apnews.com/article/a", &profile).unwrap();
        assert_eq!(raw.title, "Stocks rally to record");
        assert_eq!(raw.description.as_deref(), Some("Wall Street closed higher."));
        assert_eq!(raw.timestamp.as_deref(), Some("2025-05-06T14:30:00Z"));
        assert_eq!(raw.image.as_deref(), Some("/img/rally.jpg"));
        assert_eq!(raw.href.as_deref(), Some("https://apnews.com/article/a"));
    }

    #[test]
    fn test_topic_links_collapse_dot_segments() {
        let doc = Document::parse(
            r#"<a href="./article/x">One</a><a href="/hub/../article/x">Two</a><a href="/article/a b">Three</a>"#,
        );
        let links = topic_links(&doc, &SiteProfile::default(), 10);
        assert_eq!(
            links,
            vec![
                "https://apnews.com/article/x",
                "https://apnews.com/article/a%20b",
            ]
        );
    }

    #[test]
    fn test_read_article_page_without_headline() {
        let doc = Document::parse("<html><body><p>Just text</p></body></html>");
        assert!(read_article_page(&doc, "https://apnews.com/x", &SiteProfile::default()).is_none());
    }

    #[tokio::test]
    async fn test_scan_article_pages_skips_failures() {
        let profile = SiteProfile::default();
        let links = vec![
            "https://apnews.com/article/broken".to_string(),
            "https://apnews.com/article/good".to_string(),
            "https://apnews.com/article/headless".to_string(),
        ];
        let source = ScriptedSource::default()
            .respond(&links[0], vec![Err(FetchError::Timeout), Err(FetchError::Timeout)])
            .respond(&links[1], vec![Ok(ARTICLE.to_string())])
            .respond(&links[2], vec![Ok("<p>no headline</p>".to_string())]);
        let mut fetcher = Fetcher::new(source, "https://apnews.com/", 2)
            .with_backoff(Duration::ZERO, Duration::ZERO);

        let fetched_at = Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap();
        let mut cascade = Cascade::new(&profile, fetched_at, 10);
        let added = scan_article_pages(&mut cascade, &mut fetcher, &profile, &links).await;
        assert_eq!(added, 1);

        let records = cascade.into_records();
        assert_eq!(records[0].title, "Stocks rally to record");
        assert_eq!(records[0].url, "https://apnews.com/article/good");
        assert_eq!(records[0].description, "Wall Street closed higher.");
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://apnews.com/img/rally.jpg")
        );
        assert_eq!(
            records[0].published_at,
            Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap()
        );
        // Two attempts on the broken link, one each on the others.
        assert_eq!(fetcher.source().urls().len(), 4);
    }

    #[tokio::test]
    async fn test_scan_stops_when_full() {
        let profile = SiteProfile::default();
        let links = vec![
            "https://apnews.com/article/good".to_string(),
            "https://apnews.com/article/never".to_string(),
        ];
        let source = ScriptedSource::default().respond(&links[0], vec![Ok(ARTICLE.to_string())]);
        let mut fetcher = Fetcher::new(source, "https://apnews.com/", 1)
            .with_backoff(Duration::ZERO, Duration::ZERO);
        let mut cascade = Cascade::new(&profile, Utc::now(), 1);
        scan_article_pages(&mut cascade, &mut fetcher, &profile, &links).await;
        assert_eq!(fetcher.source().urls(), vec![links[0].clone()]);
    }
}
