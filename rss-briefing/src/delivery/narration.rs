use crate::config::NarrationConfig;
use crate::types::{BriefingError, NarrationRequest, NarrationService, Result, Script};
use crate::utils::speech::strip_markdown;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct SpeechPayload<'a> {
    text: &'a str,
    voice: &'a str,
    rate: &'a str,
    format: &'a str,
}

/// Text-to-speech over HTTP: POSTs JSON, expects mp3 bytes back.
pub struct HttpNarrator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpNarrator {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            timeout,
        })
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(config: &NarrationConfig) -> Result<Option<Self>> {
        match &config.endpoint {
            Some(endpoint) => Ok(Some(Self::new(
                endpoint.clone(),
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl NarrationService for HttpNarrator {
    async fn synthesize(&self, request: &NarrationRequest) -> anyhow::Result<Vec<u8>> {
        let payload = SpeechPayload {
            text: &request.text,
            voice: &request.voice,
            rate: &request.rate,
            format: "mp3",
        };

        debug!("Requesting narration of {} chars with voice {}", request.text.len(), request.voice);
        let mut builder = self.client.post(&self.endpoint).timeout(self.timeout).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.context("narration request failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("narration service answered HTTP {}", status.as_u16()));
        }

        let audio = response.bytes().await.context("reading narration audio failed")?;
        if audio.is_empty() {
            return Err(anyhow!("narration service returned no audio"));
        }
        info!("Received {} bytes of narration audio", audio.len());
        Ok(audio.to_vec())
    }
}

/// Builds the narration input for a script: markup stripped, statistics appendix dropped.
pub fn narration_request(script: &Script, config: &NarrationConfig) -> Result<NarrationRequest> {
    let text = strip_markdown(script.text());
    if text.is_empty() {
        return Err(BriefingError::delivery("script has no speakable text"));
    }
    Ok(NarrationRequest {
        text,
        voice: config.voice.clone(),
        rate: config.rate.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RunDate, ScriptKind};
    use chrono::NaiveDate;

    #[test]
    fn request_uses_clean_text_and_voice() {
        let date = RunDate::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        let script = Script::new(
            date,
            ScriptKind::Full,
            "# Title\n\n**Hello** there\n\n## Source statistics\n- feedA: 1 items\n".to_string(),
        );
        let request = narration_request(&script, &NarrationConfig::default()).unwrap();
        assert_eq!(request.text, "Title\n\nHello there");
        assert_eq!(request.rate, "+5%");
    }

    #[test]
    fn no_endpoint_means_no_narrator() {
        assert!(HttpNarrator::from_config(&NarrationConfig::default()).unwrap().is_none());
    }
}
