use crate::types::{BriefingError, FetchConfig, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// HTTP side of a feed fetch. One attempt per call; failures go back to the caller.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Downloads the feed document at `url`. Non-2xx responses and oversized bodies are errors.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)?;
        let start_time = Instant::now();

        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, &self.config.accept)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Feed {} answered HTTP {}", url, status.as_u16());
            return Err(BriefingError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let limit = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(BriefingError::FeedTooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                });
            }
        }

        let content = response.text().await?;
        if content.len() > limit {
            return Err(BriefingError::FeedTooLarge {
                size_mb: content.len() / (1024 * 1024),
            });
        }

        debug!(
            "Fetched feed: {} ({} bytes in {} ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }
}
