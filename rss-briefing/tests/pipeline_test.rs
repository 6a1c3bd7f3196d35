use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rss_briefing::config::{AggregationConfig, BriefingConfig};
use rss_briefing::types::{
    AnalysisSection, Article, BriefingError, FetchedFeed, Result, RunDate, SourceCategory,
    SourceDescriptor, SourceSummary, Topic,
};
use rss_briefing::{
    produce_briefing, BriefingPipeline, FeedAggregator, FeedSource, MockLlmAdapter, PipelineState,
    ScriptAssembler, FALLBACK_MARKER,
};
use std::collections::HashMap;
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

const ANALYSIS: &str = "**Facts**: something happened.\n\n**Underlying logic**: because.\n\n**Actionable guidance**: watch it.\n\n**Risk caveat**: could reverse.";

/// In-memory sources keyed by URL. `None` means the source is down.
struct StaticSource {
    feeds: HashMap<String, Option<Vec<Article>>>,
}

#[async_trait]
impl FeedSource for StaticSource {
    fn source_kind(&self) -> &'static str {
        "static"
    }

    async fn pull(&self, source: &SourceDescriptor) -> Result<FetchedFeed> {
        match self.feeds.get(&source.url) {
            Some(Some(articles)) => Ok(FetchedFeed {
                name: source.label.clone().unwrap_or_else(|| source.url.clone()),
                articles: articles.clone(),
            }),
            _ => Err(BriefingError::HttpStatus {
                status: 503,
                reason: "Service Unavailable".to_string(),
            }),
        }
    }
}

/// Answers after `delay`, regardless of the source asked for.
struct SlowSource {
    delay: Duration,
}

#[async_trait]
impl FeedSource for SlowSource {
    fn source_kind(&self) -> &'static str {
        "slow"
    }

    async fn pull(&self, source: &SourceDescriptor) -> Result<FetchedFeed> {
        tokio::time::sleep(self.delay).await;
        Ok(FetchedFeed {
            name: source.url.clone(),
            articles: articles("late", 1),
        })
    }
}

fn run_date() -> RunDate {
    RunDate::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
}

fn articles(prefix: &str, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| Article::new(format!("{prefix} headline {i}"), format!("summary {i}"), prefix, None))
        .collect()
}

fn setup(
    feeds: Vec<(&str, Option<Vec<Article>>)>,
    topic_count: usize,
) -> (BriefingConfig, Arc<StaticSource>) {
    let mut config = BriefingConfig::default();
    config.selection.topic_count = topic_count;
    config.sources = feeds
        .iter()
        .map(|(name, _)| {
            SourceDescriptor::new(format!("https://{name}.example/rss"), SourceCategory::Signal)
                .with_label(*name)
        })
        .collect();
    let source = StaticSource {
        feeds: feeds
            .into_iter()
            .map(|(name, articles)| (format!("https://{name}.example/rss"), articles))
            .collect(),
    };
    (config, Arc::new(source))
}

#[tokio::test]
async fn test_empty_pool_skips_both_model_tiers() -> Result<()> {
    init_tracing();
    let (config, source) = setup(vec![("feedA", None), ("feedB", None)], 5);
    let llm = Arc::new(MockLlmAdapter::new("unused"));

    let mut pipeline = BriefingPipeline::new(&config, source, llm.clone());
    let outcome = pipeline.run(run_date(), Utc::now()).await?;

    assert_eq!(llm.call_count(), 0);
    assert!(outcome.script.is_fallback());
    assert!(outcome.script.text().contains(FALLBACK_MARKER));
    assert!(outcome.script.text().contains("feedA: failed"));
    assert!(outcome.topics.is_empty());
    assert_eq!(
        pipeline.history(),
        &[
            PipelineState::Idle,
            PipelineState::Aggregating,
            PipelineState::AssemblingFallback,
            PipelineState::Done
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_model_over_delivery_is_truncated_to_k() -> Result<()> {
    init_tracing();
    let (config, source) = setup(vec![("wire", Some(articles("wire", 50)))], 5);
    let llm = Arc::new(
        MockLlmAdapter::new("scripted")
            .with_reply("1. One\n2. Two\n3. Three\n4. Four\n5. Five\n6. Six\n7. Seven")
            .with_fallback(ANALYSIS),
    );

    let mut pipeline = BriefingPipeline::new(&config, source, llm.clone());
    let outcome = pipeline.run(run_date(), Utc::now()).await?;

    let labels: Vec<_> = outcome.topics.iter().map(Topic::as_str).collect();
    assert_eq!(labels, vec!["One", "Two", "Three", "Four", "Five"]);
    assert_eq!(pipeline.state(), PipelineState::Done);

    // One fast-tier selection call, then one deep call per topic.
    let calls = llm.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0].model, config.models.fast);
    assert!(calls[0].reasoning_budget.is_none());
    assert!(!calls[0].user.contains("summary 0"));
    assert!(calls[1..].iter().all(|c| c.model == config.models.deep_reasoning));
    assert!(calls[1..].iter().all(|c| c.reasoning_budget == Some(3000)));
    assert!(calls[1].user.starts_with("Topic: One"));
    assert!(calls[5].user.starts_with("Topic: Five"));

    for (i, label) in labels.iter().enumerate() {
        assert!(outcome.script.text().contains(&format!("## {}. {}", i + 1, label)));
    }
    Ok(())
}

#[tokio::test]
async fn test_model_under_delivery_is_padded_from_headlines() -> Result<()> {
    init_tracing();
    let (config, source) = setup(vec![("wire", Some(articles("wire", 10)))], 5);
    let llm = Arc::new(
        MockLlmAdapter::new("scripted")
            .with_reply("Alpha\nwire headline 0\nBeta")
            .with_fallback(ANALYSIS),
    );

    let mut pipeline = BriefingPipeline::new(&config, source, llm.clone());
    let outcome = pipeline.run(run_date(), Utc::now()).await?;

    let labels: Vec<_> = outcome.topics.iter().map(Topic::as_str).collect();
    assert_eq!(
        labels,
        vec!["Alpha", "wire headline 0", "Beta", "wire headline 1", "wire headline 2"]
    );
    assert_eq!(llm.call_count(), 6);
    Ok(())
}

#[tokio::test]
async fn test_selection_failure_fails_the_run() -> Result<()> {
    init_tracing();
    let (config, source) = setup(vec![("wire", Some(articles("wire", 3)))], 2);
    let llm = Arc::new(MockLlmAdapter::new("broken").with_failure("HTTP 500"));

    let mut pipeline = BriefingPipeline::new(&config, source, llm.clone());
    let err = pipeline.run(run_date(), Utc::now()).await.unwrap_err();

    assert!(matches!(err, BriefingError::Selection(_)));
    assert!(err.is_fatal());
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert_eq!(llm.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_analysis_failure_returns_no_partial_script() -> Result<()> {
    init_tracing();
    let (config, source) = setup(vec![("wire", Some(articles("wire", 3)))], 2);
    let llm = Arc::new(
        MockLlmAdapter::new("flaky")
            .with_reply("First\nSecond")
            .with_reply(ANALYSIS)
            .with_failure("deadline exceeded"),
    );

    let mut pipeline = BriefingPipeline::new(&config, source, llm.clone());
    let err = pipeline.run(run_date(), Utc::now()).await.unwrap_err();

    assert!(matches!(err, BriefingError::Analysis(ref msg) if msg.contains("Second")));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert_eq!(
        pipeline.history().last(),
        Some(&PipelineState::Failed)
    );
    assert!(!pipeline.history().contains(&PipelineState::AssemblingFull));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_runs_once_per_instance() -> Result<()> {
    init_tracing();
    let (config, source) = setup(vec![("feedA", None)], 5);
    let mut pipeline = BriefingPipeline::new(&config, source, Arc::new(MockLlmAdapter::new("unused")));

    pipeline.run(run_date(), Utc::now()).await?;
    let second = pipeline.run(run_date(), Utc::now()).await;
    assert!(matches!(second, Err(BriefingError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test]
async fn test_fallback_document_is_idempotent() -> Result<()> {
    init_tracing();
    let mut texts = Vec::new();
    for _ in 0..2 {
        let (config, source) = setup(vec![("feedA", None), ("feedB", None)], 5);
        let mut pipeline =
            BriefingPipeline::new(&config, source, Arc::new(MockLlmAdapter::new("unused")));
        texts.push(pipeline.run(run_date(), Utc::now()).await?.script.text().to_string());
    }
    assert_eq!(texts[0], texts[1]);
    Ok(())
}

#[test]
fn test_assembly_includes_each_part_once_in_order() {
    let assembler = ScriptAssembler::new(BriefingConfig::default().script);
    let sections: Vec<AnalysisSection> = (0..4)
        .map(|i| AnalysisSection {
            topic: Topic::new(&format!("Topic {i}")).unwrap(),
            body: format!("UNIQUE-BODY-{i}"),
        })
        .collect();
    let overview = "UNIQUE-OVERVIEW";

    let script = assembler.assemble(run_date(), overview, &sections, &SourceSummary::default());
    let text = script.text();

    assert_eq!(text.matches(overview).count(), 1);
    let mut last = text.find(overview).unwrap();
    for section in &sections {
        assert_eq!(text.matches(&section.body).count(), 1);
        let at = text.find(&section.body).unwrap();
        assert!(at > last);
        last = at;
    }
}

#[tokio::test]
async fn test_script_is_persisted_without_delivery() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let (config, source) = setup(vec![("wire", Some(articles("wire", 4)))], 2);
    let llm = Arc::new(
        MockLlmAdapter::new("scripted")
            .with_reply("A\nB")
            .with_fallback(ANALYSIS),
    );

    let mut pipeline = BriefingPipeline::new(&config, source, llm);
    let report = produce_briefing(&mut pipeline, None, dir.path(), run_date(), Utc::now()).await?;

    assert!(report.delivery.is_none());
    assert_eq!(report.paths.markdown, dir.path().join("briefing_20261016.md"));
    let saved = std::fs::read_to_string(&report.paths.markdown)?;
    assert_eq!(saved, report.outcome.script.text());
    info!("Persisted {} bytes", saved.len());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_hanging_source_is_cut_off_by_timeout_guard() -> Result<()> {
    init_tracing();
    let aggregator = FeedAggregator::new(
        Arc::new(SlowSource {
            delay: Duration::from_secs(600),
        }),
        AggregationConfig::default(),
        Duration::from_secs(15),
    );
    let sources = vec![
        SourceDescriptor::new("https://slow.example/rss", SourceCategory::Macro).with_label("slow"),
    ];

    let started = tokio::time::Instant::now();
    let aggregation = aggregator.aggregate(&sources, Utc::now()).await;

    assert!(aggregation.pool.is_empty());
    assert_eq!(aggregation.summary.failed(), 1);
    assert!(aggregation.summary.render().contains("slow: failed (timed out after 15s)"));
    assert!(started.elapsed() < Duration::from_secs(600));
    Ok(())
}
