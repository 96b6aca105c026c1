//! Small helpers shared across modules.
//!
//! - Feed date formatting
//! - String truncation for logging
//! - Image MIME type inference

use chrono::{DateTime, Utc};
use url::Url;

/// Format a timestamp the way RSS readers expect `pubDate`.
///
/// Always rendered in UTC with a literal `GMT` suffix, e.g.
/// `Mon, 06 May 2025 14:30:00 GMT`.
pub fn rss_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Guess an image MIME type from the extension of the URL's last path
/// segment.
///
/// Unknown extensions, and values that do not parse as URLs, default to
/// `image/jpeg`, the most common format on news sites.
pub fn image_mime_type(url: &str) -> &'static str {
    let ext = Url::parse(url)
        .ok()
        .and_then(|u| {
            let name = u.path_segments()?.next_back()?;
            name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
        })
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}
