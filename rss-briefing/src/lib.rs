pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod delivery;
pub mod digest;
pub mod fetcher;
pub mod llm_adapter;
pub mod parser;
pub mod pipeline;
pub mod rss_utils;
pub mod selector;
pub mod sources;
pub mod traits;
pub mod types;
pub mod utils;

pub use aggregator::{Aggregation, FeedAggregator};
pub use analyzer::DeepAnalyzer;
pub use config::BriefingConfig;
pub use delivery::{ArtifactPaths, Delivery, DeliveryReport, DeliveryStep, StepOutcome};
pub use digest::{ScriptAssembler, FALLBACK_MARKER};
pub use fetcher::Fetcher;
pub use llm_adapter::{MockLlmAdapter, OpenAiCompatibleAdapter};
pub use parser::FeedParser;
pub use pipeline::{produce_briefing, BriefingPipeline, PipelineState, RunOutcome, RunReport};
pub use selector::TopicSelector;
pub use sources::RssFeedSource;
pub use traits::FeedSource;
pub use types::{BriefingError, Result};
