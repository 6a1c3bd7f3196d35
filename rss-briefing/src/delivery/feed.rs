use crate::rss_utils::time::rss_date;
use crate::types::{Result, RunDate};
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::path::Path;
use tracing::info;

/// The single episode a syndication feed advertises: the latest briefing audio.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub run_date: RunDate,
    pub audio_url: String,
    pub audio_length: u64,
    pub page_url: Option<String>,
    pub published: DateTime<Utc>,
}

/// RSS 2.0 document with one item and an `audio/mpeg` enclosure.
pub fn render_feed(channel_title: &str, site_url: Option<&str>, item: &FeedItem) -> String {
    let date = item.run_date.to_string();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n");
    xml.push_str(&format!("<title>{}</title>\n", text(channel_title)));
    if let Some(site) = site_url {
        xml.push_str(&format!("<link>{}</link>\n", text(site)));
    }
    xml.push_str(&format!(
        "<description>{} audio edition</description>\n",
        text(channel_title)
    ));
    xml.push_str("<item>\n");
    xml.push_str(&format!("<title>{} {}</title>\n", text(channel_title), date));
    if let Some(page) = &item.page_url {
        xml.push_str(&format!("<link>{}</link>\n", text(page)));
    }
    xml.push_str(&format!("<pubDate>{}</pubDate>\n", rss_date(item.published)));
    xml.push_str(&format!(
        "<enclosure url=\"{}\" type=\"audio/mpeg\" length=\"{}\"/>\n",
        attr(&item.audio_url),
        item.audio_length
    ));
    xml.push_str(&format!(
        "<guid isPermaLink=\"false\">{}</guid>\n",
        item.run_date.key()
    ));
    xml.push_str("</item>\n</channel>\n</rss>\n");
    xml
}

pub fn write_feed(path: &Path, xml: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, xml)?;
    info!("Wrote syndication feed to {}", path.display());
    Ok(())
}
