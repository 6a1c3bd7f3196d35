use crate::config::{AnalysisConfig, ModelTiers};
use crate::types::{
    AnalysisSection, BriefingError, CandidatePool, CompletionRequest, CompletionService, Result,
    Topic,
};
use std::sync::Arc;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are a rigorous business intelligence analyst.\n\
Rules:\n\
1. Base every statement strictly on the news material provided. If something is unclear, leave it out. Never fabricate.\n\
2. Material without a date is from the past 24 hours. Never invent future dates.\n\
3. Answer in standard Markdown.";

/// Part labels every analysis is asked to carry, in order.
pub const RUBRIC: [&str; 4] = ["Facts", "Underlying logic", "Actionable guidance", "Risk caveat"];

/// One deep-reasoning call per topic, strictly in topic order.
pub struct DeepAnalyzer {
    llm: Arc<dyn CompletionService>,
    model: String,
    config: AnalysisConfig,
}

impl DeepAnalyzer {
    pub fn new(llm: Arc<dyn CompletionService>, tiers: &ModelTiers, config: AnalysisConfig) -> Self {
        Self {
            llm,
            model: tiers.deep_reasoning.clone(),
            config,
        }
    }

    fn material(pool: &CandidatePool) -> String {
        let mut material = String::new();
        for (i, article) in pool.articles().iter().enumerate() {
            material.push_str(&format!("{}. [{}] {}\n", i + 1, article.source(), article.title()));
            if !article.summary().is_empty() {
                material.push_str(&format!("Summary: {}\n", article.summary()));
            }
            material.push('\n');
        }
        material
    }

    pub fn build_request(&self, topic: &Topic, material: &str) -> CompletionRequest {
        let user = format!(
            "Topic: {topic}\n\n\
             Analyse this topic using only the news material below. \
             Structure the answer in exactly four parts, each opened by its bold label:\n\
             1. **{}**: what happened, from the material.\n\
             2. **{}**: who gains, who loses, and the policy or business mechanics underneath.\n\
             3. **{}**: concrete short and medium term moves for a reader.\n\
             4. **{}**: what could make this wrong.\n\
             Do not add a heading for the topic itself.\n\n\
             News material:\n{material}",
            RUBRIC[0], RUBRIC[1], RUBRIC[2], RUBRIC[3]
        );

        CompletionRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user,
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
            reasoning_budget: self.config.reasoning_budget(),
        }
    }

    /// All sections or an error; a partial analysis is never returned.
    pub async fn analyze(&self, topics: &[Topic], pool: &CandidatePool) -> Result<Vec<AnalysisSection>> {
        let material = Self::material(pool);
        let mut sections = Vec::with_capacity(topics.len());

        for (i, topic) in topics.iter().enumerate() {
            info!("Analysing topic {}/{}: {}", i + 1, topics.len(), topic);
            let request = self.build_request(topic, &material);

            let response = self.llm.complete(&request).await.map_err(|e| {
                BriefingError::Analysis(format!("topic '{}': {:#}", topic, e))
            })?;

            let body = response.text.trim().to_string();
            if body.is_empty() {
                return Err(BriefingError::Analysis(format!(
                    "topic '{}': model returned an empty analysis",
                    topic
                )));
            }

            let missing: Vec<&str> = RUBRIC
                .iter()
                .copied()
                .filter(|part| !body.to_lowercase().contains(&part.to_lowercase()))
                .collect();
            if !missing.is_empty() {
                warn!(topic = %topic, "analysis lacks rubric parts: {}", missing.join(", "));
            }

            sections.push(AnalysisSection {
                topic: topic.clone(),
                body,
            });
        }

        Ok(sections)
    }
}
