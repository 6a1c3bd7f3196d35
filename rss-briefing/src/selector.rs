use crate::config::{ModelTiers, SelectionConfig};
use crate::types::{BriefingError, CandidatePool, CompletionRequest, CompletionService, Result, Topic};
use interfaces::baseline::pad_with_titles;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are a rigorous business intelligence editor. \
From the candidate headlines, pick the stories with the most consequence for markets, \
policy and business. Work only from the headlines given; never invent events.";

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:[-*+•·]+(?:\s+|$)|#{1,6}|\(?\d{1,3}(?:[.):]\)?(?:\s+|$)|[、：]\)?)|(?i:topic)\s*\d+\s*[:：.)-])\s*",
    )
    .unwrap()
});

static LEAD_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:sure|okay|ok|certainly|of course|absolutely|here (?:are|is)|below (?:are|is)|the following|these are)\b").unwrap()
});

/// Narrows the candidate pool to K analysis topics with one fast-tier call.
pub struct TopicSelector {
    llm: Arc<dyn CompletionService>,
    model: String,
    config: SelectionConfig,
}

impl TopicSelector {
    pub fn new(llm: Arc<dyn CompletionService>, tiers: &ModelTiers, config: SelectionConfig) -> Self {
        Self {
            llm,
            model: tiers.fast.clone(),
            config,
        }
    }

    /// Titles only: the fast tier never sees summaries.
    pub fn build_request(&self, pool: &CandidatePool) -> CompletionRequest {
        let k = self.config.topic_count;
        let mut user = format!(
            "Choose exactly {k} topics for today's deep analysis.\n\
             Reply with {k} lines, one short topic label per line, nothing else.\n\n\
             Candidate headlines:\n"
        );
        for (i, title) in pool.titles().enumerate() {
            user.push_str(&format!("{}. {}\n", i + 1, title));
        }

        CompletionRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            reasoning_budget: None,
        }
    }

    /// Exactly K topics when the pool holds at least K distinct titles.
    pub async fn select(&self, pool: &CandidatePool) -> Result<Vec<Topic>> {
        let k = self.config.topic_count;
        let request = self.build_request(pool);

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| BriefingError::Selection(format!("{e:#}")))?;

        let mut topics = parse_topics(&response.text, k);
        if topics.len() < k {
            warn!(
                "Model proposed {} of {} topics, padding from headlines",
                topics.len(),
                k
            );
            pad_with_titles(&mut topics, pool, k);
        }

        info!("Selected {} topics", topics.len());
        Ok(topics)
    }
}

fn strip_line(line: &str) -> String {
    let mut current = line.trim().to_string();
    // "- 1. **Topic**" carries several markers in a row.
    for _ in 0..3 {
        let next = LIST_MARKER.replace(&current, "").to_string();
        if next == current {
            break;
        }
        current = next;
    }
    current
        .replace("**", "")
        .trim_matches(|c: char| c.is_whitespace() || "\"'`“”‘’「」*_".contains(c))
        .to_string()
}

/// Parses free-form model output into at most `k` distinct topics.
pub fn parse_topics(text: &str, k: usize) -> Vec<Topic> {
    let mut topics: Vec<Topic> = Vec::with_capacity(k);
    for line in text.lines() {
        if topics.len() >= k {
            break;
        }
        let label = strip_line(line);
        // Lead-ins such as "Here are the topics:" or "Sure, ..." are not topics.
        if label.ends_with(':') || label.ends_with('：') || LEAD_IN.is_match(&label) {
            continue;
        }
        let Some(topic) = Topic::new(&label) else {
            continue;
        };
        if topics.iter().any(|t| t.matches(topic.as_str())) {
            continue;
        }
        topics.push(topic);
    }
    topics
}
