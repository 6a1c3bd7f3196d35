use crate::sources::default_feeds;
use crate::types::{BriefingError, FetchConfig, Result, RunDate, SourceDescriptor};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Placeholder meaning "read this value from the process environment".
pub const ENV_SENTINEL: &str = "ENV";

pub const AI_KEY_VAR: &str = "DASHSCOPE_API_KEY";
pub const BARK_KEY_VAR: &str = "BARK_KEY";
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
pub const NARRATION_KEY_VAR: &str = "NARRATION_API_KEY";

/// Everything a briefing run needs, built once at startup and passed by reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    pub run: RunConfig,
    pub fetch: FetchConfig,
    pub aggregation: AggregationConfig,
    pub models: ModelTiers,
    pub ai: AiConfig,
    pub selection: SelectionConfig,
    pub analysis: AnalysisConfig,
    pub script: ScriptConfig,
    pub narration: NarrationConfig,
    pub notify: NotifyConfig,
    pub publish: PublishConfig,
    pub sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub feed_path: PathBuf,
    pub retention_days: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            feed_path: PathBuf::from("feed.xml"),
            retention_days: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub recency_window_hours: i64,
    pub max_candidates: usize,
    pub concurrency: usize,
    /// Drop exact duplicate titles (case-insensitive) across sources.
    pub dedupe_titles: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            recency_window_hours: 25,
            max_candidates: 60,
            concurrency: 6,
            dedupe_titles: false,
        }
    }
}

/// Model identifiers per capability tier. The only place model ids live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelTiers {
    pub fast: String,
    pub deep_reasoning: String,
}

impl Default for ModelTiers {
    fn default() -> Self {
        Self {
            fast: "qwen-plus".to_string(),
            deep_reasoning: "qwen3-max".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub reasoning_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            api_key: Some(ENV_SENTINEL.to_string()),
            request_timeout_secs: 60,
            reasoning_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub topic_count: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            topic_count: 5,
            max_tokens: 512,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub reasoning: bool,
    pub reasoning_ceiling: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 1500,
            temperature: 0.2,
            reasoning: true,
            reasoning_ceiling: 16_000,
        }
    }
}

impl AnalysisConfig {
    /// Twice the requested output length, capped at the ceiling.
    pub fn reasoning_budget(&self) -> Option<u32> {
        self.reasoning
            .then(|| self.max_output_tokens.saturating_mul(2).min(self.reasoning_ceiling))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub title: String,
    pub overview_items: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            title: "Morning Brief".to_string(),
            overview_items: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Text-to-speech endpoint. Narration is skipped when unset.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub voice: String,
    pub rate: String,
    pub timeout_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            voice: "en-US-AndrewNeural".to_string(),
            rate: "+5%".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Bark device key. Notification is skipped when unset.
    pub bark_key: Option<String>,
    pub server: String,
    pub group: String,
    pub icon: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bark_key: None,
            server: "https://api.day.app".to_string(),
            group: "MorningBrief".to_string(),
            icon: None,
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

/// Where the published artifacts can be reached from outside.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// `owner/repo`, used to derive GitHub Pages and raw content URLs.
    pub repository: Option<String>,
    pub branch: String,
    pub page_base_url: Option<String>,
    pub audio_base_url: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repository: None,
            branch: "main".to_string(),
            page_base_url: None,
            audio_base_url: None,
        }
    }
}

impl PublishConfig {
    fn repository_parts(&self) -> Option<(&str, &str)> {
        let repository = self.repository.as_deref()?;
        let (owner, repo) = repository.split_once('/')?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some((owner, repo))
    }

    fn page_base(&self) -> Option<String> {
        if let Some(base) = &self.page_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        let (owner, repo) = self.repository_parts()?;
        Some(format!("https://{owner}.github.io/{repo}/output"))
    }

    fn audio_base(&self) -> Option<String> {
        if let Some(base) = &self.audio_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        let (owner, repo) = self.repository_parts()?;
        Some(format!(
            "https://raw.githubusercontent.com/{owner}/{repo}/{}/output",
            self.branch
        ))
    }

    pub fn page_url(&self, run_date: RunDate) -> Option<String> {
        self.page_base()
            .map(|base| format!("{base}/briefing_{}.html", run_date.key()))
    }

    pub fn audio_url(&self, run_date: RunDate) -> Option<String> {
        self.audio_base()
            .map(|base| format!("{base}/briefing_{}.mp3", run_date.key()))
    }

    /// Channel link of the syndication feed.
    pub fn site_url(&self) -> Option<String> {
        if let Some(base) = &self.page_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        let (owner, repo) = self.repository_parts()?;
        Some(format!("https://{owner}.github.io/{repo}/"))
    }
}

fn resolve_secret<F>(value: Option<String>, var: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match value.as_deref() {
        None | Some(ENV_SENTINEL) => lookup(var).filter(|v| !v.trim().is_empty()),
        Some(v) if v.trim().is_empty() => None,
        Some(_) => value,
    }
}

fn check_http_url(field: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| BriefingError::config(format!("{field}: invalid URL '{raw}': {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(BriefingError::config(format!(
            "{field}: unsupported scheme '{}' in '{raw}'",
            url.scheme()
        )));
    }
    Ok(())
}

impl BriefingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: BriefingConfig = toml::from_str(content)?;
        if config.sources.is_empty() {
            config.sources = default_feeds::catalog();
        }
        Ok(config)
    }

    /// Loads the file (or built-in defaults when `path` is `None`) and resolves
    /// `ENV` placeholders from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(path).map_err(|e| {
                    BriefingError::config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&content)?
            }
            None => {
                debug!("No configuration file, using defaults");
                Self::from_toml_str("")?
            }
        };
        Ok(config.resolve_secrets_with(|var| std::env::var(var).ok()))
    }

    /// Replaces `ENV` placeholders using `lookup`. Runs once, before any component is built.
    pub fn resolve_secrets_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.ai.api_key = resolve_secret(self.ai.api_key.take(), AI_KEY_VAR, &lookup);
        self.notify.bark_key = resolve_secret(self.notify.bark_key.take(), BARK_KEY_VAR, &lookup);
        self.narration.api_key =
            resolve_secret(self.narration.api_key.take(), NARRATION_KEY_VAR, &lookup);
        self.publish.repository =
            resolve_secret(self.publish.repository.take(), REPOSITORY_VAR, &lookup);
        self
    }

    /// Fails fast on anything that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(BriefingError::config("no sources configured"));
        }
        for source in &self.sources {
            check_http_url("sources", &source.url)?;
        }
        if self.selection.topic_count == 0 {
            return Err(BriefingError::config("selection.topic_count must be at least 1"));
        }
        if self.aggregation.max_candidates == 0 {
            return Err(BriefingError::config("aggregation.max_candidates must be at least 1"));
        }
        if self.aggregation.concurrency == 0 {
            return Err(BriefingError::config("aggregation.concurrency must be at least 1"));
        }
        if self.aggregation.recency_window_hours <= 0 {
            return Err(BriefingError::config("aggregation.recency_window_hours must be positive"));
        }
        if self.models.fast.trim().is_empty() || self.models.deep_reasoning.trim().is_empty() {
            return Err(BriefingError::config("models.fast and models.deep_reasoning are required"));
        }
        check_http_url("ai.base_url", &self.ai.base_url)?;
        if self.ai.api_key.is_none() {
            return Err(BriefingError::config(format!(
                "missing AI API key (set ai.api_key or {AI_KEY_VAR})"
            )));
        }
        if let Some(endpoint) = &self.narration.endpoint {
            check_http_url("narration.endpoint", endpoint)?;
        }
        if self.notify.bark_key.is_some() {
            check_http_url("notify.server", &self.notify.server)?;
        }
        Ok(())
    }
}
