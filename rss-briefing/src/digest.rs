use crate::config::ScriptConfig;
use crate::types::{AnalysisSection, CandidatePool, RunDate, Script, ScriptKind, SourceSummary};
use crate::utils::speech::STATS_HEADING;
use tracing::{debug, info};

/// Marker carried by every fallback document.
pub const FALLBACK_MARKER: &str = "No update today";

const TRANSITION: &str = "Now for today's deep dives.";
const CLOSING: &str = "That's all for today. Stay sharp, and see you tomorrow.";

/// Deterministic assembly of the final document. No model is involved here.
pub struct ScriptAssembler {
    config: ScriptConfig,
}

impl ScriptAssembler {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    fn header(&self, run_date: RunDate) -> String {
        format!("# {}\n**{}**\n\n", self.config.title, run_date.long_form())
    }

    fn statistics(summary: &SourceSummary) -> String {
        format!("{}\n\n{}", STATS_HEADING, summary.render())
    }

    /// Headline panorama: the first few pool entries as `- **source**: title`.
    pub fn overview(&self, pool: &CandidatePool) -> String {
        pool.articles()
            .iter()
            .take(self.config.overview_items)
            .map(|article| format!("- **{}**: {}", article.source(), article.title()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Preamble, overview, transition, sections, closing, statistics. In that order.
    pub fn assemble(
        &self,
        run_date: RunDate,
        overview: &str,
        sections: &[AnalysisSection],
        summary: &SourceSummary,
    ) -> Script {
        let mut doc = self.header(run_date);
        doc.push_str(&format!(
            "Good morning. This is your {} for {}.\n\n",
            self.config.title,
            run_date.long_form()
        ));

        doc.push_str("## Overview\n\n");
        doc.push_str(overview.trim_end());
        doc.push_str("\n\n");

        doc.push_str(TRANSITION);
        doc.push_str("\n\n");

        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                doc.push_str("---\n\n");
            }
            doc.push_str(&format!("## {}. {}\n\n", i + 1, section.topic));
            doc.push_str(section.body.trim_end());
            doc.push_str("\n\n");
        }

        doc.push_str(CLOSING);
        doc.push_str("\n\n");
        doc.push_str(&Self::statistics(summary));

        info!("Assembled briefing with {} sections ({} chars)", sections.len(), doc.len());
        Script::new(run_date, ScriptKind::Full, doc)
    }

    /// The "no update" document. Equal inputs give byte-identical output.
    pub fn assemble_fallback(&self, run_date: RunDate, summary: &SourceSummary) -> Script {
        let mut doc = self.header(run_date);
        doc.push_str("---\n\n");
        doc.push_str(&format!("## {}\n\n", FALLBACK_MARKER));
        doc.push_str("No usable news signals were detected inside today's window.\n\n");
        doc.push_str("Likely causes:\n");
        doc.push_str("1. Sources paused for a holiday\n");
        doc.push_str("2. Network connectivity problems\n");
        doc.push_str("3. Upstream anti-scraping changes\n\n");
        doc.push_str(&Self::statistics(summary));

        debug!("Assembled fallback briefing for {}", run_date);
        Script::new(run_date, ScriptKind::Fallback, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Article, SourceCategory, SourceOutcome, SourceReport, Topic};
    use chrono::NaiveDate;

    fn date() -> RunDate {
        RunDate::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    fn summary() -> SourceSummary {
        SourceSummary::new(vec![SourceReport {
            name: "feedA".to_string(),
            category: SourceCategory::Signal,
            outcome: SourceOutcome::Failed("HTTP 503".to_string()),
        }])
    }

    #[test]
    fn overview_lists_leading_headlines() {
        let assembler = ScriptAssembler::new(ScriptConfig {
            overview_items: 2,
            ..ScriptConfig::default()
        });
        let pool = CandidatePool::new(
            vec![
                Article::new("One", "", "Wire", None),
                Article::new("Two", "", "Agency", None),
                Article::new("Three", "", "Wire", None),
            ],
            60,
        );
        assert_eq!(assembler.overview(&pool), "- **Wire**: One\n- **Agency**: Two");
    }

    #[test]
    fn full_document_keeps_part_order() {
        let assembler = ScriptAssembler::new(ScriptConfig::default());
        let sections = vec![AnalysisSection {
            topic: Topic::new("Rates").unwrap(),
            body: "BODY-ONE".to_string(),
        }];
        let script = assembler.assemble(date(), "OVERVIEW", &sections, &summary());
        let text = script.text();
        let positions: Vec<usize> = [
            "Good morning.",
            "OVERVIEW",
            TRANSITION,
            "## 1. Rates",
            "BODY-ONE",
            CLOSING,
            STATS_HEADING,
        ]
        .iter()
        .map(|part| text.find(part).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(script.kind(), ScriptKind::Full);
    }

    #[test]
    fn fallback_carries_marker_and_diagnostics() {
        let assembler = ScriptAssembler::new(ScriptConfig::default());
        let script = assembler.assemble_fallback(date(), &summary());
        assert!(script.is_fallback());
        assert!(script.text().contains(FALLBACK_MARKER));
        assert!(script.text().contains("feedA: failed (HTTP 503)"));
        assert!(script.text().contains("Friday, October 16, 2026"));
    }
}
