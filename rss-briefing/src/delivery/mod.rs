//! Everything that happens to a finished script. Each step is independent:
//! a failure is logged and reported, and the remaining steps still run.

pub mod feed;
pub mod html;
pub mod narration;
pub mod notify;
pub mod retention;

use crate::config::{BriefingConfig, NarrationConfig, PublishConfig};
use crate::types::{BriefingError, NarrationService, Notifier, Result, RunDate, Script};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

/// On-disk names of one run's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub output_dir: PathBuf,
    pub markdown: PathBuf,
    pub html: PathBuf,
    pub audio: PathBuf,
}

impl ArtifactPaths {
    pub fn for_run(output_dir: &Path, run_date: RunDate) -> Self {
        let stem = format!("briefing_{}", run_date.key());
        Self {
            output_dir: output_dir.to_path_buf(),
            markdown: output_dir.join(format!("{stem}.md")),
            html: output_dir.join(format!("{stem}.html")),
            audio: output_dir.join(format!("{stem}.mp3")),
        }
    }

    pub fn audio_file_name(&self) -> String {
        self.audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Writes the script as Markdown. Runs before any delivery step; an existing file is overwritten.
pub fn persist_script(script: &Script, paths: &ArtifactPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.output_dir)?;
    std::fs::write(&paths.markdown, script.text())?;
    info!("Saved script to {}", paths.markdown.display());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStep {
    Html,
    Narration,
    Feed,
    Notification,
    Retention,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub steps: Vec<(DeliveryStep, StepOutcome)>,
}

impl DeliveryReport {
    pub fn outcome(&self, step: DeliveryStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    pub fn failures(&self) -> Vec<DeliveryStep> {
        self.steps
            .iter()
            .filter(|(_, o)| matches!(o, StepOutcome::Failed(_)))
            .map(|(s, _)| *s)
            .collect()
    }

    fn record(&mut self, step: DeliveryStep, result: Result<StepOutcome>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(step = ?step, error = %e, "delivery step failed");
                StepOutcome::Failed(e.to_string())
            }
        };
        if let StepOutcome::Skipped(reason) = &outcome {
            info!("Delivery step {:?} skipped: {}", step, reason);
        }
        self.steps.push((step, outcome));
    }
}

/// Renders and publishes a persisted script.
pub struct Delivery {
    title: String,
    feed_path: PathBuf,
    retention_days: u64,
    narration: NarrationConfig,
    publish: PublishConfig,
    narrator: Option<Arc<dyn NarrationService>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Delivery {
    pub fn new(config: &BriefingConfig) -> Self {
        Self {
            title: config.script.title.clone(),
            feed_path: config.run.feed_path.clone(),
            retention_days: config.run.retention_days,
            narration: config.narration.clone(),
            publish: config.publish.clone(),
            narrator: None,
            notifier: None,
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn NarrationService>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn deliver(&self, script: &Script, paths: &ArtifactPaths, now: DateTime<Utc>) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        report.record(DeliveryStep::Html, self.render_html(script, paths));
        report.record(DeliveryStep::Narration, self.narrate(script, paths).await);
        report.record(DeliveryStep::Feed, self.write_feed(script, paths, now));
        report.record(DeliveryStep::Notification, self.notify(script).await);
        report.record(
            DeliveryStep::Retention,
            retention::sweep(&paths.output_dir, self.retention_days, SystemTime::now())
                .map(|_| StepOutcome::Done),
        );

        let failed = report.failures();
        if failed.is_empty() {
            info!("Delivery finished for {}", script.run_date());
        } else {
            warn!("Delivery finished for {} with failed steps: {:?}", script.run_date(), failed);
        }
        report
    }

    fn render_html(&self, script: &Script, paths: &ArtifactPaths) -> Result<StepOutcome> {
        let page = html::render_page(script, &self.title, &paths.audio_file_name());
        std::fs::write(&paths.html, page)?;
        info!("Wrote page to {}", paths.html.display());
        Ok(StepOutcome::Done)
    }

    async fn narrate(&self, script: &Script, paths: &ArtifactPaths) -> Result<StepOutcome> {
        let Some(narrator) = &self.narrator else {
            return Ok(StepOutcome::Skipped("no narration service configured".to_string()));
        };
        let request = narration::narration_request(script, &self.narration)?;
        let audio = narrator
            .synthesize(&request)
            .await
            .map_err(|e| BriefingError::delivery(format!("narration: {e:#}")))?;
        std::fs::write(&paths.audio, &audio)?;
        info!("Wrote {} bytes of audio to {}", audio.len(), paths.audio.display());
        Ok(StepOutcome::Done)
    }

    fn write_feed(&self, script: &Script, paths: &ArtifactPaths, now: DateTime<Utc>) -> Result<StepOutcome> {
        let Some(audio_url) = self.publish.audio_url(script.run_date()) else {
            return Ok(StepOutcome::Skipped("no public audio URL configured".to_string()));
        };
        let Ok(metadata) = std::fs::metadata(&paths.audio) else {
            return Ok(StepOutcome::Skipped("no audio artifact for this run".to_string()));
        };
        let item = feed::FeedItem {
            run_date: script.run_date(),
            audio_url,
            audio_length: metadata.len(),
            page_url: self.publish.page_url(script.run_date()),
            published: now,
        };
        let xml = feed::render_feed(&self.title, self.publish.site_url().as_deref(), &item);
        feed::write_feed(&self.feed_path, &xml)?;
        Ok(StepOutcome::Done)
    }

    async fn notify(&self, script: &Script) -> Result<StepOutcome> {
        let Some(notifier) = &self.notifier else {
            return Ok(StepOutcome::Skipped("no notifier configured".to_string()));
        };
        let notification =
            notify::notification_for(script, &self.title, self.publish.page_url(script.run_date()));
        notifier
            .notify(&notification)
            .await
            .map_err(|e| BriefingError::delivery(format!("notification: {e:#}")))?;
        Ok(StepOutcome::Done)
    }
}
