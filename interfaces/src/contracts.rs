use anyhow::Result;
use async_trait::async_trait;

// Contracts for the external services a briefing run talks to.
// Implementations live in the pipeline crate; tests substitute scripted ones.

/// One chat-completion call against a configured model tier.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Extended-reasoning token budget. `None` disables reasoning.
    pub reasoning_budget: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    fn service_name(&self) -> String;

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

/// Text-to-speech input. `text` must already be free of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationRequest {
    pub text: String,
    pub voice: String,
    pub rate: String,
}

#[async_trait]
pub trait NarrationService: Send + Sync {
    /// Returns encoded audio (mp3).
    async fn synthesize(&self, request: &NarrationRequest) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub click_url: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}
