//! Creative-variant ranking
//!
//! Scores each variant on headline, call-to-action, visual structure, and
//! campaign relevance, combines them with [`ScoreWeights`], and derives win
//! probability and percentile rank. Fully deterministic; equal composites
//! keep their input order.

use atelier_core::{AtelierError, Result, ScoreWeights};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CTA_MARKERS: &[&str] = &[
    "sign up", "learn more", "get started", "try", "buy", "shop", "join", "download",
    "book", "subscribe", "start",
];

/// One variant submitted for ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInput {
    /// Deliverable id when the variant is already stored
    pub deliverable_id: Option<Uuid>,
    pub content: String,
}

/// Sub-scores behind a composite
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VariantScores {
    pub headline: f64,
    pub cta: f64,
    pub visual: f64,
    pub relevance: f64,
}

/// One ranked variant
#[derive(Debug, Clone, Serialize)]
pub struct RankedVariant {
    /// Position of the variant in the submitted list
    pub input_index: usize,
    pub deliverable_id: Option<Uuid>,
    pub scores: VariantScores,
    pub composite: f64,
    /// Share of the total composite mass (sums to 1 across variants)
    pub win_probability: f64,
    /// 100.0 for the top variant, 0.0 for the bottom
    pub percentile: f64,
}

pub struct VariantRanker {
    weights: ScoreWeights,
}

impl VariantRanker {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Rank variants against a campaign goal, best first
    pub fn rank(&self, variants: &[VariantInput], campaign_goal: &str) -> Result<Vec<RankedVariant>> {
        if variants.len() < 2 {
            return Err(AtelierError::InvalidInput(format!(
                "ranking requires at least 2 variants, got {}",
                variants.len()
            )));
        }

        let mut ranked: Vec<RankedVariant> = variants
            .iter()
            .enumerate()
            .map(|(input_index, variant)| {
                let scores = Self::score(&variant.content, campaign_goal);
                let composite = self.weights.calculate(
                    scores.headline,
                    scores.cta,
                    scores.visual,
                    scores.relevance,
                );
                RankedVariant {
                    input_index,
                    deliverable_id: variant.deliverable_id,
                    scores,
                    composite,
                    win_probability: 0.0,
                    percentile: 0.0,
                }
            })
            .collect();

        let total: f64 = ranked.iter().map(|r| r.composite).sum();
        for variant in &mut ranked {
            variant.win_probability = if total > 0.0 {
                variant.composite / total
            } else {
                1.0 / variants.len() as f64
            };
        }

        // Stable sort keeps input order for equal composites
        ranked.sort_by(|a, b| {
            b.composite
                .partial_cmp(&a.composite)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let n = ranked.len();
        for (position, variant) in ranked.iter_mut().enumerate() {
            variant.percentile = 100.0 * (n - 1 - position) as f64 / (n - 1) as f64;
        }

        Ok(ranked)
    }

    fn score(content: &str, campaign_goal: &str) -> VariantScores {
        VariantScores {
            headline: Self::headline_score(content),
            cta: Self::cta_score(content),
            visual: Self::visual_score(content),
            relevance: Self::relevance_score(content, campaign_goal),
        }
    }

    /// First line in the 20-70 character sweet spot scores highest
    fn headline_score(content: &str) -> f64 {
        let headline = content.lines().next().unwrap_or("").trim();
        let len = headline.chars().count();
        match len {
            0 => 0.0,
            1..=19 => len as f64 / 20.0,
            20..=70 => 1.0,
            _ => (140usize.saturating_sub(len)) as f64 / 70.0,
        }
    }

    fn cta_score(content: &str) -> f64 {
        let lowered = content.to_lowercase();
        let hits = CTA_MARKERS.iter().filter(|m| lowered.contains(*m)).count();
        match hits {
            0 => 0.0,
            1 => 1.0,
            // Competing calls to action dilute each other
            _ => 0.6,
        }
    }

    /// Structure as a proxy for visual quality: short paragraphs score,
    /// a single unbroken wall of text does not
    fn visual_score(content: &str) -> f64 {
        let blocks = content
            .split("\n\n")
            .filter(|b| !b.trim().is_empty())
            .count();
        let longest_line = content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let block_score = (blocks as f64 / 3.0).min(1.0);
        let line_score = if longest_line <= 120 {
            1.0
        } else {
            (240usize.saturating_sub(longest_line)) as f64 / 120.0
        };
        (block_score + line_score) / 2.0
    }

    fn relevance_score(content: &str, campaign_goal: &str) -> f64 {
        let keywords: Vec<String> = campaign_goal
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return 0.5;
        }
        let lowered = content.to_lowercase();
        let matched = keywords.iter().filter(|k| lowered.contains(*k)).count();
        matched as f64 / keywords.len() as f64
    }
}

impl Default for VariantRanker {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}
