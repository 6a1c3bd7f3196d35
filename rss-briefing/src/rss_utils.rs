/// Feed-specific helpers shared by the parser, aggregator and feed writer

/// URL utilities for feed sources
pub mod url {
    use url::Url;

    /// Readable stand-in name for a source that never told us its title: `host/path`.
    pub fn display_name(url_str: &str) -> String {
        match Url::parse(url_str) {
            Ok(url) => {
                let host = url.host_str().unwrap_or_default();
                let path = url.path().trim_end_matches('/');
                format!("{host}{path}")
            }
            Err(_) => url_str.to_string(),
        }
    }
}

/// Time utilities for the recency window
pub mod time {
    use chrono::{DateTime, Duration, Utc};

    /// Oldest publication time still considered current.
    pub fn recency_cutoff(now: DateTime<Utc>, window_hours: i64) -> DateTime<Utc> {
        now - Duration::hours(window_hours)
    }

    /// RFC 2822 form used in RSS `pubDate`.
    pub fn rss_date(at: DateTime<Utc>) -> String {
        at.to_rfc2822()
    }
}

/// Feed content utilities
pub mod feed {
    /// Extract clean text content from HTML
    pub fn extract_text_from_html(html: &str) -> String {
        let stripped = html
            .chars()
            .fold((String::new(), false), |(mut text, in_tag), c| match c {
                '<' => (text, true),
                '>' => {
                    if in_tag {
                        text.push(' ');
                    }
                    (text, false)
                }
                _ if !in_tag => {
                    text.push(c);
                    (text, in_tag)
                }
                _ => (text, in_tag),
            })
            .0;

        html_escape::decode_html_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Strips aggregator branding from a feed title ("RSSHub", " - " separators).
    pub fn clean_source_name(title: &str) -> String {
        title
            .replace("RSSHub", "")
            .replace(" - ", " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| c == '-' || c.is_whitespace())
            .to_string()
    }
}
