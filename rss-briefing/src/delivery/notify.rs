use crate::config::NotifyConfig;
use crate::types::{BriefingError, Notification, Notifier, Result, Script};
use crate::utils::speech::strip_markdown;
use crate::utils::text::{flatten_whitespace, truncate_chars, truncate_with_ellipsis};
use anyhow::anyhow;
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const BODY_MAX_CHARS: usize = 100;
pub const FALLBACK_BODY: &str = "No usable news today";
const LEAD_MAX_CHARS: usize = 60;

/// Bark push notifications (`{server}/{key}/{title}/{body}`).
pub struct BarkNotifier {
    client: Client,
    server: String,
    key: String,
    group: String,
    icon: Option<String>,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl BarkNotifier {
    pub fn new(server: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            server: server.into(),
            key: key.into(),
            group: "MorningBrief".to_string(),
            icon: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// `None` when no device key is configured.
    pub fn from_config(config: &NotifyConfig) -> Result<Option<Self>> {
        let Some(key) = &config.bark_key else {
            return Ok(None);
        };
        let mut notifier = Self::new(config.server.clone(), key.clone())?
            .with_timeout(config.timeout_secs)
            .with_retries(config.max_retries);
        notifier.group = config.group.clone();
        notifier.icon = config.icon.clone();
        Ok(Some(notifier))
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn push_url(&self, notification: &Notification) -> Result<Url> {
        let mut url = Url::parse(&self.server)?;
        let body = truncate_with_ellipsis(&flatten_whitespace(&notification.body), BODY_MAX_CHARS);
        url.path_segments_mut()
            .map_err(|_| BriefingError::config(format!("notify server '{}' cannot take a path", self.server)))?
            .pop_if_empty()
            .push(&self.key)
            .push(&notification.title)
            .push(&body);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("group", &self.group);
            if let Some(icon) = &self.icon {
                query.append_pair("icon", icon);
            }
            if let Some(click_url) = &notification.click_url {
                query.append_pair("url", click_url);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Notifier for BarkNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let url = self.push_url(notification)?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: self.retry_delay,
            initial_interval: self.retry_delay,
            max_interval: self.retry_delay * 16,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.client.get(url.clone()).timeout(self.timeout).send().await;
            let error = match result {
                Ok(response) if response.status().is_success() => {
                    info!("Notification delivered: {}", notification.title);
                    return Ok(());
                }
                Ok(response) => anyhow!("notification endpoint answered HTTP {}", response.status().as_u16()),
                Err(e) => anyhow!("notification request failed: {e}"),
            };

            if attempt > self.max_retries {
                return Err(error);
            }
            match backoff.next_backoff() {
                Some(delay) => {
                    warn!("Attempt {} failed ({}), retrying in {:?}", attempt, error, delay);
                    tokio::time::sleep(delay).await;
                }
                None => return Err(error),
            }
        }
    }
}

/// Notification text for a script: a fixed line for fallbacks, otherwise the opening of the spoken text.
pub fn notification_for(script: &Script, title: &str, click_url: Option<String>) -> Notification {
    let body = if script.is_fallback() {
        FALLBACK_BODY.to_string()
    } else {
        truncate_chars(&flatten_whitespace(&strip_markdown(script.text())), LEAD_MAX_CHARS)
    };
    Notification {
        title: format!("{} {}", script.run_date().short_form(), title),
        body,
        click_url,
    }
}
