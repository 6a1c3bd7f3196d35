use crate::aggregator::{Aggregation, FeedAggregator};
use crate::analyzer::DeepAnalyzer;
use crate::config::BriefingConfig;
use crate::delivery::{persist_script, ArtifactPaths, Delivery, DeliveryReport};
use crate::digest::ScriptAssembler;
use crate::selector::TopicSelector;
use crate::traits::FeedSource;
use crate::types::{
    BriefingError, CompletionService, Result, RunDate, Script, SourceDescriptor, SourceSummary,
    Topic,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Aggregating,
    AssemblingFallback,
    Selecting,
    Analyzing,
    AssemblingFull,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Idle, Aggregating) => true,
            (Aggregating, AssemblingFallback) | (Aggregating, Selecting) => true,
            (AssemblingFallback, Done) => true,
            (Selecting, Analyzing) => true,
            (Analyzing, AssemblingFull) => true,
            (AssemblingFull, Done) => true,
            (Selecting, Failed) | (Analyzing, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a successful synthesis run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub script: Script,
    pub summary: SourceSummary,
    pub topics: Vec<Topic>,
}

/// Sequences aggregation, selection, analysis and assembly for one run.
pub struct BriefingPipeline {
    sources: Vec<SourceDescriptor>,
    aggregator: FeedAggregator,
    selector: TopicSelector,
    analyzer: DeepAnalyzer,
    assembler: ScriptAssembler,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl BriefingPipeline {
    pub fn new(
        config: &BriefingConfig,
        source: Arc<dyn FeedSource>,
        llm: Arc<dyn CompletionService>,
    ) -> Self {
        let aggregator = FeedAggregator::new(
            source,
            config.aggregation.clone(),
            Duration::from_secs(config.fetch.timeout_seconds),
        );
        info!(
            "Pipeline uses {} (fast: {}, deep: {})",
            llm.service_name(),
            config.models.fast,
            config.models.deep_reasoning
        );
        let selector = TopicSelector::new(llm.clone(), &config.models, config.selection.clone());
        let analyzer = DeepAnalyzer::new(llm, &config.models, config.analysis.clone());

        Self {
            sources: config.sources.clone(),
            aggregator,
            selector,
            analyzer,
            assembler: ScriptAssembler::new(config.script.clone()),
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    fn transition(&mut self, next: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BriefingError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        info!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    fn fail(&mut self, err: BriefingError) -> BriefingError {
        error!(state = %self.state, "briefing run failed: {}", err);
        if let Err(e) = self.transition(PipelineState::Failed) {
            warn!("{}", e);
        }
        err
    }

    /// Runs once per pipeline instance. A selection or analysis error leaves the pipeline in `Failed`.
    pub async fn run(&mut self, run_date: RunDate, now: DateTime<Utc>) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("briefing_run", %run_id, date = %run_date);
        self.run_inner(run_id, run_date, now).instrument(span).await
    }

    async fn run_inner(&mut self, run_id: Uuid, run_date: RunDate, now: DateTime<Utc>) -> Result<RunOutcome> {
        self.transition(PipelineState::Aggregating)?;
        let Aggregation { pool, summary } = self.aggregator.aggregate(&self.sources, now).await;

        if pool.is_empty() {
            warn!("Candidate pool is empty, assembling the fallback briefing");
            self.transition(PipelineState::AssemblingFallback)?;
            let script = self.assembler.assemble_fallback(run_date, &summary);
            self.transition(PipelineState::Done)?;
            return Ok(RunOutcome {
                run_id,
                script,
                summary,
                topics: Vec::new(),
            });
        }

        self.transition(PipelineState::Selecting)?;
        let topics = match self.selector.select(&pool).await {
            Ok(topics) => topics,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(PipelineState::Analyzing)?;
        let sections = match self.analyzer.analyze(&topics, &pool).await {
            Ok(sections) => sections,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(PipelineState::AssemblingFull)?;
        let overview = self.assembler.overview(&pool);
        let script = self.assembler.assemble(run_date, &overview, &sections, &summary);
        self.transition(PipelineState::Done)?;

        Ok(RunOutcome {
            run_id,
            script,
            summary,
            topics,
        })
    }
}

/// Everything one invocation produced.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub paths: ArtifactPaths,
    pub delivery: Option<DeliveryReport>,
}

/// Synthesis, then persistence, then (optionally) delivery.
///
/// The Markdown is on disk before any delivery step starts, so delivery
/// failures never lose the script.
pub async fn produce_briefing(
    pipeline: &mut BriefingPipeline,
    delivery: Option<&Delivery>,
    output_dir: &Path,
    run_date: RunDate,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let outcome = pipeline.run(run_date, now).await?;

    let paths = ArtifactPaths::for_run(output_dir, run_date);
    persist_script(&outcome.script, &paths)?;

    let delivery = match delivery {
        Some(delivery) => Some(delivery.deliver(&outcome.script, &paths, now).await),
        None => {
            info!("Delivery skipped");
            None
        }
    };

    Ok(RunReport {
        outcome,
        paths,
        delivery,
    })
}
