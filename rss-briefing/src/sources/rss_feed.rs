use crate::rss_utils::url::display_name;
use crate::traits::FeedSource;
use crate::types::{Article, FetchConfig, FetchedFeed, Result, SourceDescriptor};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::debug;

/// RSS/Atom over HTTP: the production `FeedSource`.
pub struct RssFeedSource {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        let parser = FeedParser::new(&fetch_config);
        let fetcher = Fetcher::new(fetch_config)?;
        Ok(Self { fetcher, parser })
    }
}

/// Name a source is reported under: configured label, then feed title, then URL.
pub fn source_name(source: &SourceDescriptor, feed_title: Option<&str>) -> String {
    source
        .label
        .clone()
        .or_else(|| feed_title.map(|t| t.to_string()))
        .unwrap_or_else(|| display_name(&source.url))
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn source_kind(&self) -> &'static str {
        "rss"
    }

    async fn pull(&self, source: &SourceDescriptor) -> Result<FetchedFeed> {
        let content = self.fetcher.fetch_feed(&source.url).await?;
        let parsed = self.parser.parse_feed(&content)?;

        let name = source_name(source, parsed.title.as_deref());
        let articles: Vec<Article> = parsed
            .entries
            .into_iter()
            .map(|entry| Article::new(entry.title, entry.summary, name.clone(), entry.published_at))
            .collect();

        debug!("Pulled {} entries from {} ({})", articles.len(), name, source.url);
        Ok(FetchedFeed { name, articles })
    }
}
