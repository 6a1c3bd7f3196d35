use crate::types::{FetchedFeed, Result, SourceDescriptor};
use async_trait::async_trait;

/// Trait for pulling articles from one configured source.
///
/// Implementations must not retry and must not touch any shared state: the
/// aggregator runs several of these concurrently and merges their results.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human-readable name of this implementation (for logs)
    fn source_kind(&self) -> &'static str;

    /// Fetch and parse `source`, returning every entry it currently lists
    async fn pull(&self, source: &SourceDescriptor) -> Result<FetchedFeed>;
}
