use crate::config::AiConfig;
use crate::types::{BriefingError, CompletionRequest, CompletionResponse, CompletionService, Result};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_thinking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_budget: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
///
/// Reasoning is requested through the `enable_thinking` / `thinking_budget`
/// extension fields and gets the longer of the two configured timeouts.
pub struct OpenAiCompatibleAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    request_timeout: Duration,
    reasoning_timeout: Duration,
}

impl OpenAiCompatibleAdapter {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| BriefingError::config("AI API key is not configured"))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            reasoning_timeout: Duration::from_secs(config.reasoning_timeout_secs),
        })
    }

    pub fn timeout_for(&self, request: &CompletionRequest) -> Duration {
        if request.reasoning_budget.is_some() {
            self.reasoning_timeout
        } else {
            self.request_timeout
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatibleAdapter {
    fn service_name(&self) -> String {
        format!("openai-compatible ({})", self.endpoint)
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            enable_thinking: request.reasoning_budget.map(|_| true),
            thinking_budget: request.reasoning_budget,
        };

        let timeout = self.timeout_for(request);
        debug!(
            model = %request.model,
            reasoning_budget = ?request.reasoning_budget,
            "Sending completion request (timeout {:?})",
            timeout
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("completion request to {} failed", request.model))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "completion endpoint answered HTTP {}: {}",
                status.as_u16(),
                detail.chars().take(300).collect::<String>()
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("completion response was not valid JSON")?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("completion response carried no choices"))?;

        info!(model = %request.model, "Received completion ({} chars)", text.len());
        Ok(CompletionResponse { text })
    }
}

/// Scripted adapter for development and testing.
///
/// Replies are served in order; once exhausted the fallback reply is repeated.
/// Every request is recorded so callers can assert what was (or was not) asked.
pub struct MockLlmAdapter {
    name: String,
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Err(anyhow!(message.into())));
        self
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    fn push(&self, reply: anyhow::Result<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionService for MockLlmAdapter {
    fn service_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        let text = match next {
            Some(reply) => reply?,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow!("{}: no scripted reply left", self.name))?,
        };
        Ok(CompletionResponse { text })
    }
}
