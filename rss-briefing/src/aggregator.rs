use crate::config::AggregationConfig;
use crate::rss_utils::time::recency_cutoff;
use crate::sources::rss_feed::source_name;
use crate::traits::FeedSource;
use crate::types::{
    Article, CandidatePool, SourceDescriptor, SourceOutcome, SourceReport, SourceSummary,
};
use crate::utils::text::title_key;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Output of one aggregation pass.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub pool: CandidatePool,
    pub summary: SourceSummary,
}

/// Fans a `FeedSource` out over the configured sources and merges the results in source order.
pub struct FeedAggregator {
    source: Arc<dyn FeedSource>,
    config: AggregationConfig,
    fetch_timeout: Duration,
}

impl FeedAggregator {
    pub fn new(source: Arc<dyn FeedSource>, config: AggregationConfig, fetch_timeout: Duration) -> Self {
        Self {
            source,
            config,
            fetch_timeout,
        }
    }

    /// Never fails: a source that errors or times out is recorded as failed and skipped.
    pub async fn aggregate(&self, sources: &[SourceDescriptor], now: DateTime<Utc>) -> Aggregation {
        let cutoff = recency_cutoff(now, self.config.recency_window_hours);

        info!(
            "Fetching {} sources via {} (concurrency {})",
            sources.len(),
            self.source.source_kind(),
            self.config.concurrency
        );

        // `buffered` yields in input order, so each fetch owns its result until the merge below.
        let results: Vec<(SourceReport, Vec<Article>)> = stream::iter(sources)
            .map(|descriptor| self.pull_one(descriptor, cutoff))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut reports = Vec::with_capacity(results.len());
        let mut articles = Vec::new();
        for (report, kept) in results {
            reports.push(report);
            articles.extend(kept);
        }

        if self.config.dedupe_titles {
            articles = dedupe_by_title(articles);
        }

        let summary = SourceSummary::new(reports);
        let succeeded = summary.reports().len() - summary.failed();
        let pool = CandidatePool::new(articles, self.config.max_candidates);

        info!(
            "Successfully fetched {}/{} sources, {} candidate articles",
            succeeded,
            sources.len(),
            pool.len()
        );

        Aggregation { pool, summary }
    }

    async fn pull_one(
        &self,
        descriptor: &SourceDescriptor,
        cutoff: DateTime<Utc>,
    ) -> (SourceReport, Vec<Article>) {
        let outcome = tokio::time::timeout(self.fetch_timeout, self.source.pull(descriptor)).await;

        match outcome {
            Ok(Ok(feed)) => {
                let total = feed.articles.len();
                let kept: Vec<Article> = feed
                    .articles
                    .into_iter()
                    .filter(|article| article.is_recent(cutoff))
                    .collect();
                debug!(
                    source = %feed.name,
                    count = kept.len(),
                    "kept {} of {} entries inside the recency window",
                    kept.len(),
                    total
                );
                let report = SourceReport {
                    name: feed.name,
                    category: descriptor.category,
                    outcome: SourceOutcome::Fetched(kept.len()),
                };
                (report, kept)
            }
            Ok(Err(e)) => {
                let name = source_name(descriptor, None);
                warn!(source = %name, url = %descriptor.url, error = %e, "source fetch failed");
                let report = SourceReport {
                    name,
                    category: descriptor.category,
                    outcome: SourceOutcome::Failed(e.to_string()),
                };
                (report, Vec::new())
            }
            Err(_) => {
                let name = source_name(descriptor, None);
                warn!(source = %name, url = %descriptor.url, "source fetch timed out");
                let report = SourceReport {
                    name,
                    category: descriptor.category,
                    outcome: SourceOutcome::Failed(format!(
                        "timed out after {}s",
                        self.fetch_timeout.as_secs()
                    )),
                };
                (report, Vec::new())
            }
        }
    }
}

/// Keeps the first article of every case-insensitive title.
fn dedupe_by_title(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let mut seen = HashSet::new();
    let unique: Vec<Article> = articles
        .into_iter()
        .filter(|article| seen.insert(title_key(article.title())))
        .collect();
    if unique.len() < before {
        info!("Removed {} duplicate titles", before - unique.len());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let articles = vec![
            Article::new("Fed holds", "a", "wire", None),
            Article::new("FED  HOLDS", "b", "agency", None),
            Article::new("Oil slips", "c", "wire", None),
        ];
        let unique = dedupe_by_title(articles);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].summary(), "a");
        assert_eq!(unique[1].title(), "Oil slips");
    }
}
