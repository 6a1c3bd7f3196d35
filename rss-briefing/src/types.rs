use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
// Use the interfaces crate for core types
pub use interfaces::contracts::{
    CompletionRequest, CompletionResponse, CompletionService, NarrationRequest, NarrationService,
    Notification, Notifier,
};
pub use interfaces::defs::{
    AnalysisSection, Article, CandidatePool, RunDate, Script, ScriptKind, SourceCategory,
    SourceDescriptor, SourceOutcome, SourceReport, SourceSummary, Topic,
};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub max_entries_per_source: usize,
    pub summary_max_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: FEED_ACCEPT.to_string(),
            timeout_seconds: 15,
            max_feed_size_mb: 10,
            max_redirects: 5,
            max_entries_per_source: 15,
            summary_max_chars: 300,
        }
    }
}

/// Raw result of parsing one feed document.
#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug)]
pub struct ParsedEntry {
    pub title: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Articles of one source together with the name they are reported under.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub name: String,
    pub articles: Vec<Article>,
}

#[derive(Debug, thiserror::Error)]
pub enum BriefingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Feed parsing failed: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Topic selection failed: {0}")]
    Selection(String),

    #[error("Deep analysis failed: {0}")]
    Analysis(String),

    #[error("Illegal pipeline transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Delivery step failed: {0}")]
    Delivery(String),

    #[error("Feed too large: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BriefingError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// True for failures that must stop the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Selection(_) | Self::Analysis(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, BriefingError>;
