//! Field normalization for scraped articles.
//!
//! Turns raw strings pulled from the page into the guaranteed shape of an
//! [`ArticleRecord`]: absolute URLs, non-empty title and description, and a
//! publication time that falls back to the fetch time instead of failing.

use crate::config::SiteProfile;
use crate::models::ArticleRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use url::Url;

static RELATIVE_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bago\b").unwrap());

/// Naive datetime formats, tried in order after RFC 3339 and RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only formats; midnight UTC is assumed.
const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"];

/// Resolve `href` against `base`.
///
/// Values that already parse as absolute URLs are returned unchanged.
/// Everything else, protocol-relative values included, is joined onto
/// `base`, which drops dot segments and percent-encodes what needs it.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if Url::parse(href).is_ok() {
        return Some(href.to_string());
    }
    base.join(href).ok().map(String::from)
}

/// Parse a scraped timestamp, or `None` if it is relative or unrecognised.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() || RELATIVE_TIME.is_match(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Epoch values: 13 digits are milliseconds, 10 are seconds.
    if s.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        return match s.len() {
            13 => Utc.timestamp_millis_opt(n).single(),
            10 => Utc.timestamp_opt(n, 0).single(),
            _ => None,
        };
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Raw fields pulled from a page before normalization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawFields {
    pub title: String,
    pub href: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<String>,
    pub image: Option<String>,
}

/// Applies the site's defaults to raw fields.
#[derive(Debug, Clone)]
pub struct Normalizer<'p> {
    profile: &'p SiteProfile,
    site_root: Option<Url>,
    fetched_at: DateTime<Utc>,
}

impl<'p> Normalizer<'p> {
    pub fn new(profile: &'p SiteProfile, fetched_at: DateTime<Utc>) -> Self {
        let site_root = match Url::parse(&profile.site_root) {
            Ok(root) => Some(root),
            Err(e) => {
                warn!(
                    site_root = %profile.site_root,
                    error = %e,
                    "Site root is not a valid URL; only absolute links will resolve"
                );
                None
            }
        };
        Normalizer {
            profile,
            site_root,
            fetched_at,
        }
    }

    fn resolve(&self, href: &str) -> Option<String> {
        match &self.site_root {
            Some(root) => resolve_url(root, href),
            None => Url::parse(href).is_ok().then(|| href.to_string()),
        }
    }

    /// Trimmed title, or the profile's untitled label when blank.
    pub fn title(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.profile.untitled_label.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// Absolute article URL. A missing or blank href points at the hub.
    pub fn url(&self, href: Option<&str>) -> String {
        href.map(str::trim)
            .filter(|h| !h.is_empty())
            .and_then(|h| self.resolve(h))
            .unwrap_or_else(|| self.profile.hub_url.clone())
    }

    pub fn description(&self, raw: Option<&str>, title: &str) -> String {
        match raw.map(str::trim).filter(|d| !d.is_empty()) {
            Some(desc) => desc.to_string(),
            None => format!("{}{}", self.profile.description_prefix, title),
        }
    }

    pub fn published_at(&self, raw: Option<&str>) -> DateTime<Utc> {
        raw.and_then(parse_timestamp).unwrap_or(self.fetched_at)
    }

    pub fn image(&self, raw: Option<&str>) -> Option<String> {
        raw.map(str::trim)
            .filter(|src| !src.is_empty() && !src.starts_with("data:"))
            .and_then(|src| self.resolve(src))
    }

    pub fn record(&self, raw: &RawFields) -> ArticleRecord {
        let title = self.title(&raw.title);
        ArticleRecord {
            url: self.url(raw.href.as_deref()),
            description: self.description(raw.description.as_deref(), &title),
            published_at: self.published_at(raw.timestamp.as_deref()),
            image_url: self.image(raw.image.as_deref()),
            title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetch_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    fn join(root: &str, href: &str) -> String {
        resolve_url(&Url::parse(root).unwrap(), href).unwrap()
    }

    #[test]
    fn test_resolve_absolute_url_unchanged() {
        let url = "https://apnews.com/article/x?y=1";
        assert_eq!(join("https://example.com", url), url);
        assert_eq!(join("https://example.com", "http://a.b/c"), "http://a.b/c");
    }

    #[test]
    fn test_resolve_relative_with_and_without_slash() {
        assert_eq!(join("https://example.com", "/a/b"), "https://example.com/a/b");
        assert_eq!(join("https://example.com/", "/a/b"), "https://example.com/a/b");
        assert_eq!(join("https://example.com", "a/b"), "https://example.com/a/b");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let once = join("https://example.com", "/a/b");
        assert_eq!(join("https://example.com", &once), once);
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            join("https://apnews.com", "//cdn.example.com/i.jpg"),
            "https://cdn.example.com/i.jpg"
        );
    }

    #[test]
    fn test_path_with_colon_is_not_a_scheme() {
        assert_eq!(join("https://example.com", "/a:b"), "https://example.com/a:b");
        assert_eq!(join("https://example.com", "1:2"), "https://example.com/1:2");
    }

    #[test]
    fn test_resolve_removes_dot_segments() {
        assert_eq!(join("https://apnews.com", "./article/x"), "https://apnews.com/article/x");
        assert_eq!(join("https://apnews.com", "../article/x"), "https://apnews.com/article/x");
        assert_eq!(join("https://apnews.com", "/a/./b/../c"), "https://apnews.com/a/c");
    }

    #[test]
    fn test_resolve_percent_encodes_spaces() {
        assert_eq!(join("https://apnews.com", "/article/a b"), "https://apnews.com/article/a%20b");
        assert_eq!(
            join("https://apnews.com", "article/x?q=a b"),
            "https://apnews.com/article/x?q=a%20b"
        );
    }

    #[test]
    fn test_invalid_site_root_keeps_absolute_links_only() {
        let profile = SiteProfile {
            site_root: "not a url".to_string(),
            ..SiteProfile::default()
        };
        let n = Normalizer::new(&profile, fetch_time());
        assert_eq!(n.url(Some("/article/x")), profile.hub_url);
        assert_eq!(n.url(Some("https://apnews.com/article/x")), "https://apnews.com/article/x");
        assert_eq!(n.image(Some("/img/a.jpg")), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-05-06T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-06T10:30:00-04:00"), Some(expected));
        assert_eq!(parse_timestamp("Tue, 06 May 2025 14:30:00 +0000"), Some(expected));
        assert_eq!(parse_timestamp("1746541800000"), Some(expected));
        assert_eq!(parse_timestamp("1746541800"), Some(expected));
        assert_eq!(parse_timestamp("May 06, 2025 02:30 PM"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-06 14:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("May 6, 2025"),
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_relative_and_garbage() {
        assert_eq!(parse_timestamp("3 hours ago"), None);
        assert_eq!(parse_timestamp("Updated 5 mins AGO"), None);
        assert_eq!(parse_timestamp("yesterday-ish"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("12345"), None);
    }

    #[test]
    fn test_published_at_falls_back_to_fetch_time() {
        let profile = SiteProfile::default();
        let n = Normalizer::new(&profile, fetch_time());
        assert_eq!(n.published_at(Some("2 hours ago")), fetch_time());
        assert_eq!(n.published_at(Some("not a date")), fetch_time());
        assert_eq!(n.published_at(None), fetch_time());
    }

    #[test]
    fn test_title_and_description_defaults() {
        let profile = SiteProfile::default();
        let n = Normalizer::new(&profile, fetch_time());
        assert_eq!(n.title("   "), "Financial Markets Update");
        assert_eq!(n.title("  Stocks Rally "), "Stocks Rally");
        assert_eq!(
            n.description(None, "Stocks Rally"),
            "AP News financial markets article: Stocks Rally"
        );
        assert_eq!(
            n.description(Some(" "), "X"),
            "AP News financial markets article: X"
        );
        assert_eq!(n.description(Some("Closed up"), "X"), "Closed up");
    }

    #[test]
    fn test_missing_href_points_at_hub() {
        let profile = SiteProfile::default();
        let n = Normalizer::new(&profile, fetch_time());
        assert_eq!(n.url(None), profile.hub_url);
        assert_eq!(n.url(Some("")), profile.hub_url);
        assert_eq!(
            n.url(Some("/article/stocks-rally")),
            "https://apnews.com/article/stocks-rally"
        );
    }

    #[test]
    fn test_image_skips_inline_data() {
        let profile = SiteProfile::default();
        let n = Normalizer::new(&profile, fetch_time());
        assert_eq!(n.image(Some("data:image/gif;base64,R0lGOD")), None);
        assert_eq!(
            n.image(Some("/img/a.jpg")),
            Some("https://apnews.com/img/a.jpg".to_string())
        );
    }

    #[test]
    fn test_record_combines_fields() {
        let profile = SiteProfile::default();
        let n = Normalizer::new(&profile, fetch_time());
        let record = n.record(&RawFields {
            title: "Stocks Rally".into(),
            href: Some("/article/stocks-rally".into()),
            description: Some("Markets closed higher".into()),
            timestamp: Some("1 hour ago".into()),
            image: None,
        });
        assert_eq!(record.title, "Stocks Rally");
        assert_eq!(record.url, "https://apnews.com/article/stocks-rally");
        assert_eq!(record.description, "Markets closed higher");
        assert_eq!(record.published_at, fetch_time());
        assert_eq!(record.image_url, None);
    }
}
