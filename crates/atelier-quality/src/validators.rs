//! Deterministic hard validators
//!
//! Per-type pass/fail rules that cannot be overridden by a high soft score:
//! required fields, length bounds, and forbidden claims. Every run returns
//! the full rule set so a failing rule is never silently dropped.

use atelier_core::{DeliverableType, ValidatorResult};
use regex::Regex;

const MIN_CONTENT_CHARS: usize = 40;

/// Hard validator set
pub struct HardValidators {
    forbidden_claims: Regex,
}

impl HardValidators {
    pub fn new() -> Self {
        Self {
            // Claims marketing legal will not sign off on
            forbidden_claims: Regex::new(
                r"(?i)\b(guaranteed|risk[- ]?free|100%\s+(?:results|success)|miracle|cures?)\b",
            )
            .expect("forbidden claims pattern is valid"),
        }
    }

    /// Run every rule against the content; always returns all three results
    pub fn run(&self, content: &str, deliverable_type: DeliverableType) -> Vec<ValidatorResult> {
        vec![
            self.required_fields(content, deliverable_type),
            self.length_bounds(content, deliverable_type),
            self.claims(content),
        ]
    }

    fn required_fields(
        &self,
        content: &str,
        deliverable_type: DeliverableType,
    ) -> ValidatorResult {
        let lowered = content.to_lowercase();
        let (pass, detail) = match deliverable_type {
            DeliverableType::StrategicBrief => (
                lowered.contains("objective"),
                "strategic brief must state an objective",
            ),
            DeliverableType::EmailSequence => (
                lowered.contains("subject:"),
                "email sequence must include subject lines",
            ),
            DeliverableType::VideoScript => (
                lowered.contains("scene"),
                "video script must be broken into scenes",
            ),
            _ => (true, "no required fields for this type"),
        };
        ValidatorResult {
            rule: "required_fields".to_string(),
            pass,
            detail: if pass { "ok".to_string() } else { detail.to_string() },
        }
    }

    fn length_bounds(&self, content: &str, deliverable_type: DeliverableType) -> ValidatorResult {
        let len = content.trim().len();

        let (min, max) = match deliverable_type {
            DeliverableType::AdCopy => (MIN_CONTENT_CHARS, Some(600)),
            DeliverableType::SocialMedia => (MIN_CONTENT_CHARS, Some(2_200)),
            DeliverableType::BlogArticle => (300, None),
            _ => (MIN_CONTENT_CHARS, None),
        };

        let (pass, detail) = if len < min {
            (false, format!("content is {} chars, minimum is {}", len, min))
        } else if let Some(max) = max {
            if len > max {
                (false, format!("content is {} chars, maximum is {}", len, max))
            } else {
                (true, "ok".to_string())
            }
        } else {
            (true, "ok".to_string())
        };

        ValidatorResult {
            rule: "length_bounds".to_string(),
            pass,
            detail,
        }
    }

    fn claims(&self, content: &str) -> ValidatorResult {
        match self.forbidden_claims.find(content) {
            Some(found) => ValidatorResult {
                rule: "forbidden_claims".to_string(),
                pass: false,
                detail: format!("forbidden claim: \"{}\"", found.as_str()),
            },
            None => ValidatorResult {
                rule: "forbidden_claims".to_string(),
                pass: true,
                detail: "ok".to_string(),
            },
        }
    }
}

impl Default for HardValidators {
    fn default() -> Self {
        Self::new()
    }
}
