use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar date a briefing run is produced for. Artifacts are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunDate(NaiveDate);

impl RunDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    /// Parses the compact `YYYYMMDD` form used in artifact names.
    pub fn parse_key(key: &str) -> Option<Self> {
        NaiveDate::parse_from_str(key, "%Y%m%d").ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYYMMDD`
    pub fn key(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// Long human form, e.g. "Friday, October 16, 2026".
    pub fn long_form(&self) -> String {
        self.0.format("%A, %B %-d, %Y").to_string()
    }

    /// Short form used in notification titles, e.g. "Oct 16".
    pub fn short_form(&self) -> String {
        format!("{} {:02}", self.0.format("%b"), self.0.day())
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    /// Fast market and newswire signal.
    Signal,
    /// Official and state media.
    Official,
    /// Technology, products and tooling.
    Tooling,
    /// Macro research and strategy reports.
    Macro,
}

impl SourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::Signal => "signal",
            SourceCategory::Official => "official",
            SourceCategory::Tooling => "tooling",
            SourceCategory::Macro => "macro",
        }
    }
}

/// One configured syndication feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub url: String,
    pub category: SourceCategory,
    #[serde(default)]
    pub label: Option<String>,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>, category: SourceCategory) -> Self {
        Self {
            url: url.into(),
            category,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A single news item extracted from a feed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    title: String,
    summary: String,
    source: String,
    published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        source: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            source: source.into(),
            published_at,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    /// Unknown timestamps count as current.
    pub fn is_recent(&self, cutoff: DateTime<Utc>) -> bool {
        self.published_at.is_none_or(|published| published >= cutoff)
    }
}

/// Ordered, capped list of articles for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePool {
    articles: Vec<Article>,
}

impl CandidatePool {
    /// Keeps source order and drops everything past `cap`.
    pub fn new(mut articles: Vec<Article>, cap: usize) -> Self {
        articles.truncate(cap);
        Self { articles }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(Article::title)
    }
}

/// Short label naming one subject chosen for deep analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub const MAX_CHARS: usize = 120;

    /// Trims and clips the label. Returns `None` when nothing is left.
    pub fn new(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.chars().take(Self::MAX_CHARS).collect()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Analysis of one topic: facts, underlying logic, actionable guidance, risk caveat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSection {
    pub topic: Topic,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Full,
    Fallback,
}

/// The final Markdown document of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    run_date: RunDate,
    kind: ScriptKind,
    text: String,
}

impl Script {
    pub fn new(run_date: RunDate, kind: ScriptKind, text: String) -> Self {
        Self {
            run_date,
            kind,
            text,
        }
    }

    pub fn run_date(&self) -> RunDate {
        self.run_date
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == ScriptKind::Fallback
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Articles that survived the recency window.
    Fetched(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub category: SourceCategory,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn count(&self) -> usize {
        match self.outcome {
            SourceOutcome::Fetched(count) => count,
            SourceOutcome::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Failed(_))
    }
}

/// Per-source diagnostics of one aggregation, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary {
    reports: Vec<SourceReport>,
}

impl SourceSummary {
    pub const NOTHING_EXTRACTED: &'static str =
        "No articles were extracted from any source. The network or the upstream feeds may be unavailable.";

    pub fn new(reports: Vec<SourceReport>) -> Self {
        Self { reports }
    }

    pub fn reports(&self) -> &[SourceReport] {
        &self.reports
    }

    pub fn get(&self, name: &str) -> Option<&SourceReport> {
        self.reports.iter().find(|report| report.name == name)
    }

    pub fn total(&self) -> usize {
        self.reports.iter().map(SourceReport::count).sum()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|report| report.is_failed()).count()
    }

    /// One line per source: `- name: N items`, or `- name: failed (reason)`.
    pub fn render(&self) -> String {
        if self.total() == 0 && self.failed() == self.reports.len() {
            let mut out = format!("- {}\n", Self::NOTHING_EXTRACTED);
            for report in &self.reports {
                if let SourceOutcome::Failed(reason) = &report.outcome {
                    out.push_str(&format!("- {}: failed ({})\n", report.name, reason));
                }
            }
            return out;
        }

        let mut out = String::new();
        for report in &self.reports {
            match &report.outcome {
                SourceOutcome::Fetched(count) => {
                    out.push_str(&format!("- {}: {} items\n", report.name, count))
                }
                SourceOutcome::Failed(reason) => {
                    out.push_str(&format!("- {}: failed ({})\n", report.name, reason))
                }
            }
        }
        if out.is_empty() {
            out.push_str(&format!("- {}\n", Self::NOTHING_EXTRACTED));
        }
        out
    }
}
