use crate::rss_utils::feed::{clean_source_name, extract_text_from_html};
use crate::types::{BriefingError, FetchConfig, ParsedEntry, ParsedFeed, Result};
use crate::utils::text::truncate_chars;
use feed_rs::parser;
use tracing::debug;

/// Turns RSS/Atom documents into bounded lists of entries.
pub struct FeedParser {
    max_entries: usize,
    summary_max_chars: usize,
}

impl FeedParser {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            max_entries: config.max_entries_per_source,
            summary_max_chars: config.summary_max_chars,
        }
    }

    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| BriefingError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed
            .title
            .map(|t| clean_source_name(&t.content))
            .filter(|t| !t.is_empty());

        // Entry cap applies to document order, before any recency filtering.
        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .take(self.max_entries)
            .filter_map(|entry| self.parse_entry(entry))
            .collect();

        debug!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(&self, entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
        let title = entry
            .title
            .map(|t| extract_text_from_html(&t.content))
            .filter(|t| !t.is_empty())?;

        // Prefer the summary; fall back to the content body
        let raw_summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();
        let summary = truncate_chars(&extract_text_from_html(&raw_summary), self.summary_max_chars);

        let published_at = entry.published.or(entry.updated);

        Some(ParsedEntry {
            title,
            summary,
            published_at,
        })
    }
}
