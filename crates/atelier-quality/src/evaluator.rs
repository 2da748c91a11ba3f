//! Soft quality evaluation
//!
//! The [`Evaluator`] trait is the LLM-judged half of the quality gate; the
//! [`HeuristicEvaluator`] is the deterministic in-process implementation used
//! in development and tests. Axes are clarity, relevance to the project
//! context, and completeness.

use async_trait::async_trait;
use atelier_core::{QualityAssessment, Result};

/// Project context handed to evaluation and improvement calls
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    /// The original client request text
    pub request: String,
}

impl ProjectContext {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
        }
    }

    /// Lowercased content words from the request, used for relevance checks
    fn keywords(&self) -> Vec<String> {
        self.request
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .map(|w| w.to_string())
            .collect()
    }
}

/// Soft evaluation and best-effort improvement capability
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Score content against the project context
    async fn evaluate(&self, content: &str, ctx: &ProjectContext) -> Result<QualityAssessment>;

    /// Best-effort rewrite applying the given suggestions; idempotent -
    /// improving already-improved content returns it unchanged
    async fn improve(
        &self,
        content: &str,
        suggestions: &[String],
        ctx: &ProjectContext,
    ) -> Result<String>;
}

pub const SUGGEST_SHORTEN: &str = "Shorten long sentences to improve clarity";
pub const SUGGEST_RELEVANCE: &str = "Tie the content back to the campaign goal";
pub const SUGGEST_EXPAND: &str = "Expand the content with supporting detail";

/// Deterministic heuristic evaluator
#[derive(Debug, Clone)]
pub struct HeuristicEvaluator {
    pass_threshold: f64,
}

impl HeuristicEvaluator {
    pub fn new(pass_threshold: f64) -> Self {
        Self { pass_threshold }
    }

    fn clarity(content: &str) -> f64 {
        let sentences: Vec<&str> = content
            .split(['.', '!', '?', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if sentences.is_empty() {
            return 0.0;
        }
        let avg_words = sentences
            .iter()
            .map(|s| s.split_whitespace().count())
            .sum::<usize>() as f64
            / sentences.len() as f64;
        // Full marks up to 24 words per sentence, degrading linearly after
        if avg_words <= 24.0 {
            1.0
        } else {
            (48.0 - avg_words).max(0.0) / 24.0
        }
    }

    fn relevance(content: &str, ctx: &ProjectContext) -> f64 {
        let keywords = ctx.keywords();
        if keywords.is_empty() {
            return 0.8;
        }
        let lowered = content.to_lowercase();
        let matched = keywords.iter().filter(|k| lowered.contains(*k)).count();
        (matched as f64 / keywords.len() as f64).min(1.0)
    }

    fn completeness(content: &str) -> f64 {
        let len = content.trim().len() as f64;
        (len / 200.0).min(1.0)
    }
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[async_trait]
impl Evaluator for HeuristicEvaluator {
    async fn evaluate(&self, content: &str, ctx: &ProjectContext) -> Result<QualityAssessment> {
        let clarity = Self::clarity(content);
        let relevance = Self::relevance(content, ctx);
        let completeness = Self::completeness(content);
        let overall = 0.35 * clarity + 0.35 * relevance + 0.30 * completeness;

        let mut suggestions = Vec::new();
        if clarity < 0.7 {
            suggestions.push(SUGGEST_SHORTEN.to_string());
        }
        if relevance < 0.7 {
            suggestions.push(SUGGEST_RELEVANCE.to_string());
        }
        if completeness < 0.7 {
            suggestions.push(SUGGEST_EXPAND.to_string());
        }

        Ok(QualityAssessment {
            pass: overall >= self.pass_threshold,
            clarity,
            relevance,
            completeness,
            overall,
            suggestions,
        })
    }

    async fn improve(
        &self,
        content: &str,
        suggestions: &[String],
        ctx: &ProjectContext,
    ) -> Result<String> {
        let mut improved = content.to_string();

        for suggestion in suggestions {
            match suggestion.as_str() {
                SUGGEST_RELEVANCE => {
                    let anchor = format!("This directly supports the goal: {}.", ctx.request.trim());
                    if !ctx.request.trim().is_empty() && !improved.contains(&anchor) {
                        improved.push_str("\n\n");
                        improved.push_str(&anchor);
                    }
                }
                SUGGEST_EXPAND => {
                    let detail = "Supporting detail: audience, message, and channel fit were \
                                  reviewed against the campaign plan before this draft.";
                    if !improved.contains(detail) {
                        improved.push_str("\n\n");
                        improved.push_str(detail);
                    }
                }
                SUGGEST_SHORTEN => {
                    // Break run-on sentences at comma boundaries
                    improved = improved
                        .split('\n')
                        .map(|line| {
                            if line.split_whitespace().count() > 30 {
                                line.replacen(", ", ". ", 2)
                            } else {
                                line.to_string()
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                }
                // Human-issued instruction: record it as an applied revision note
                other => {
                    let note = format!("Revised per instruction: {}", other.trim());
                    if !other.trim().is_empty() && !improved.contains(&note) {
                        improved.push_str("\n\n");
                        improved.push_str(&note);
                    }
                }
            }
        }

        Ok(improved)
    }
}
