use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::Parser;
use rss_briefing::config::BriefingConfig;
use rss_briefing::delivery::narration::HttpNarrator;
use rss_briefing::delivery::notify::BarkNotifier;
use rss_briefing::types::RunDate;
use rss_briefing::{
    produce_briefing, BriefingPipeline, Delivery, OpenAiCompatibleAdapter, RssFeedSource,
    StepOutcome,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "briefing.toml";

#[derive(Parser, Debug)]
#[command(name = "morning-brief", version, about = "Builds the daily briefing from syndication feeds")]
struct Cli {
    /// Configuration file (defaults to ./briefing.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run date as YYYYMMDD (defaults to today)
    #[arg(long, value_name = "YYYYMMDD")]
    date: Option<String>,

    /// Override run.output_dir
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Stop after the script is written
    #[arg(long)]
    skip_delivery: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_delivery(config: &BriefingConfig) -> anyhow::Result<Delivery> {
    let mut delivery = Delivery::new(config);
    if let Some(narrator) = HttpNarrator::from_config(&config.narration)? {
        delivery = delivery.with_narrator(Arc::new(narrator));
    }
    if let Some(notifier) = BarkNotifier::from_config(&config.notify)? {
        delivery = delivery.with_notifier(Arc::new(notifier));
    }
    Ok(delivery)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG);
        default.exists().then_some(default)
    });
    let mut config = BriefingConfig::load(config_path.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.run.output_dir = dir;
    }
    config.validate()?;

    let run_date = match cli.date {
        Some(key) => RunDate::parse_key(&key)
            .ok_or_else(|| anyhow!("--date must be YYYYMMDD, got '{key}'"))?,
        None => RunDate::today(),
    };
    info!("Starting briefing for {} with {} sources", run_date, config.sources.len());

    let source = Arc::new(RssFeedSource::new(config.fetch.clone())?);
    let llm = Arc::new(OpenAiCompatibleAdapter::new(&config.ai)?);
    let mut pipeline = BriefingPipeline::new(&config, source, llm);

    let delivery = if cli.skip_delivery {
        None
    } else {
        Some(build_delivery(&config)?)
    };

    let report = produce_briefing(
        &mut pipeline,
        delivery.as_ref(),
        &config.run.output_dir,
        run_date,
        Utc::now(),
    )
    .await
    .with_context(|| format!("briefing for {} failed in state {}", run_date, pipeline.state()))?;

    info!(
        run_id = %report.outcome.run_id,
        kind = ?report.outcome.script.kind(),
        topics = report.outcome.topics.len(),
        "Briefing written to {}",
        report.paths.markdown.display()
    );
    if let Some(delivery) = &report.delivery {
        for (step, outcome) in &delivery.steps {
            if let StepOutcome::Failed(reason) = outcome {
                warn!("{:?} failed: {}", step, reason);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
