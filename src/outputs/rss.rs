//! RSS 2.0 rendering and persistence.
//!
//! # Output Shape
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
//!   <channel>
//!     <title/> <link/> <description/> <lastBuildDate/>
//!     <item>
//!       <title/> <link/> <description/> <pubDate/>
//!       <media:content url=".." type=".." medium="image"/>   (optional)
//!     </item>
//!   </channel>
//! </rss>
//! ```

use crate::errors::WriteError;
use crate::models::{ArticleRecord, FeedDocument};
use crate::utils::{image_mime_type, rss_date};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const MEDIA_NAMESPACE: &str = "http://search.yahoo.com/mrss/";

fn serialize_err(e: impl std::fmt::Display) -> WriteError {
    WriteError::Serialize(e.to_string())
}

/// Render `feed` to UTF-8 XML bytes.
pub fn to_xml(feed: &FeedDocument) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(serialize_err)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:media", MEDIA_NAMESPACE));
    writer.write_event(Event::Start(rss)).map_err(serialize_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(serialize_err)?;

    write_text_element(&mut writer, "title", &feed.channel.title)?;
    write_text_element(&mut writer, "link", &feed.channel.link)?;
    write_text_element(&mut writer, "description", &feed.channel.description)?;
    write_text_element(&mut writer, "lastBuildDate", &rss_date(&feed.built_at))?;

    for item in &feed.items {
        write_item(&mut writer, item)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(serialize_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(serialize_err)?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

fn write_item<W: Write>(writer: &mut Writer<W>, item: &ArticleRecord) -> Result<(), WriteError> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .map_err(serialize_err)?;
    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "link", &item.url)?;
    write_text_element(writer, "description", &item.description)?;
    write_text_element(writer, "pubDate", &rss_date(&item.published_at))?;

    if let Some(image) = &item.image_url {
        let mut media = BytesStart::new("media:content");
        media.push_attribute(("url", image.as_str()));
        media.push_attribute(("type", image_mime_type(image)));
        media.push_attribute(("medium", "image"));
        writer.write_event(Event::Empty(media)).map_err(serialize_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .map_err(serialize_err)?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), WriteError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(serialize_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(serialize_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(serialize_err)?;
    Ok(())
}

/// Serialize `feed` and write it to `path`, replacing any previous file.
///
/// The bytes go to a hidden sibling file first and are renamed into place,
/// so a failed write never leaves a truncated feed at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_feed(feed: &FeedDocument, path: &Path) -> Result<(), WriteError> {
    let bytes = to_xml(feed)?;
    let tmp = temp_path(path);

    if let Err(source) = fs::write(&tmp, &bytes).await {
        error!(error = %source, "Failed writing feed");
        let _ = fs::remove_file(&tmp).await;
        return Err(WriteError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    if let Err(source) = fs::rename(&tmp, path).await {
        error!(error = %source, "Failed moving feed into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(WriteError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    info!(bytes = bytes.len(), items = feed.items.len(), "Wrote RSS feed");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "feed.xml".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
