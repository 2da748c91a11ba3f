//! Deterministic campaign forecasting
//!
//! Predictions come from a fixed channel-benchmark model blended with the
//! campaign's own historical metrics when it has any. The same campaign,
//! channels, and budget always produce the same numbers; there is no model
//! call and no randomness, so forecasts are reproducible and testable.

use atelier_core::{
    AtelierError, Channel, ConfidenceInterval, IndustryBenchmark, Prediction, Result,
};
use atelier_store::{CampaignStore, PredictionStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Per-channel planning assumptions: (ctr, cpc, roi multiplier)
fn channel_assumptions(channel: Channel) -> (f64, f64, f64) {
    match channel {
        Channel::Meta => (0.011, 1.20, 2.8),
        Channel::Google => (0.032, 2.30, 3.2),
        Channel::Linkedin => (0.006, 5.50, 2.2),
        Channel::Tiktok => (0.015, 1.00, 2.4),
        Channel::Email => (0.025, 0.10, 4.5),
        Channel::Organic => (0.020, 0.05, 3.8),
    }
}

fn industry_benchmark(industry: &str) -> IndustryBenchmark {
    let (avg_ctr, avg_cpc, avg_roi) = match industry.to_lowercase().as_str() {
        "saas" | "software" => (0.022, 2.40, 3.1),
        "ecommerce" | "retail" => (0.016, 0.90, 2.6),
        "finance" | "fintech" => (0.009, 3.80, 2.9),
        "healthcare" => (0.012, 2.60, 2.3),
        _ => (0.015, 1.80, 2.5),
    };
    IndustryBenchmark {
        industry: industry.to_string(),
        avg_ctr,
        avg_cpc,
        avg_roi,
    }
}

/// Weight given to a campaign's own history over the channel model
const HISTORY_BLEND: f64 = 0.6;
/// Click-to-conversion rate assumed when the campaign has no history
const DEFAULT_CONVERSION_RATE: f64 = 0.02;

pub struct Forecaster {
    campaigns: Arc<dyn CampaignStore>,
    predictions: Arc<dyn PredictionStore>,
}

impl Forecaster {
    pub fn new(campaigns: Arc<dyn CampaignStore>, predictions: Arc<dyn PredictionStore>) -> Self {
        Self {
            campaigns,
            predictions,
        }
    }

    /// Forecast a campaign's performance for a channel mix and budget
    ///
    /// The prediction is persisted before being returned; later forecasts
    /// for the same campaign supersede it without overwriting it.
    pub async fn forecast(
        &self,
        organization_id: &str,
        campaign_id: Uuid,
        channels: &[Channel],
        budget: f64,
    ) -> Result<Prediction> {
        if channels.is_empty() {
            return Err(AtelierError::InvalidInput(
                "forecast requires at least one channel".to_string(),
            ));
        }
        if budget <= 0.0 {
            return Err(AtelierError::InvalidInput(
                "forecast budget must be positive".to_string(),
            ));
        }

        let campaign = self.campaigns.get_campaign(organization_id, campaign_id).await?;
        let benchmark = industry_benchmark(&campaign.industry);

        // Channel-mix baseline: equal-split average of the assumptions
        let n = channels.len() as f64;
        let (mut ctr, mut cpc, mut roi) = (0.0, 0.0, 0.0);
        for channel in channels {
            let (c_ctr, c_cpc, c_roi) = channel_assumptions(*channel);
            ctr += c_ctr / n;
            cpc += c_cpc / n;
            roi += c_roi / n;
        }

        // Blend in the campaign's own history when it has any
        let metrics = &campaign.metrics;
        let has_history = metrics.impressions > 0 && metrics.clicks > 0;
        let mut conversion_rate = DEFAULT_CONVERSION_RATE;
        if has_history {
            let actual_ctr = metrics.clicks as f64 / metrics.impressions as f64;
            ctr = HISTORY_BLEND * actual_ctr + (1.0 - HISTORY_BLEND) * ctr;
            if metrics.spend > 0.0 {
                let actual_cpc = metrics.spend / metrics.clicks as f64;
                cpc = HISTORY_BLEND * actual_cpc + (1.0 - HISTORY_BLEND) * cpc;
                let actual_roi = metrics.revenue / metrics.spend;
                roi = HISTORY_BLEND * actual_roi + (1.0 - HISTORY_BLEND) * roi;
            }
            if metrics.conversions > 0 {
                conversion_rate = metrics.conversions as f64 / metrics.clicks as f64;
            }
        }

        let predicted_clicks = budget / cpc.max(0.01);
        let predicted_conversions = predicted_clicks * conversion_rate;
        let confidence = if has_history { 0.8 } else { 0.5 };
        let spread = roi * (1.0 - confidence);

        let mut risk_factors = Vec::new();
        if !has_history {
            risk_factors.push("no historical campaign performance".to_string());
        }
        if channels.len() == 1 {
            risk_factors.push("single-channel concentration".to_string());
        }
        if budget < 1_000.0 {
            risk_factors.push("budget below reliable channel minimums".to_string());
        }
        if roi < benchmark.avg_roi {
            risk_factors.push(format!(
                "projected ROI below the {} industry average",
                benchmark.industry
            ));
        }

        // Recommend the strongest-ROI channels from the requested mix
        let mut ranked_channels: Vec<Channel> = channels.to_vec();
        ranked_channels.sort_by(|a, b| {
            channel_assumptions(*b)
                .2
                .partial_cmp(&channel_assumptions(*a).2)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked_channels.dedup();
        ranked_channels.truncate(3);

        let prediction = Prediction {
            id: Uuid::new_v4(),
            campaign_id,
            predicted_roi: roi,
            predicted_ctr: ctr,
            predicted_cpc: cpc,
            predicted_conversions,
            confidence,
            roi_interval: ConfidenceInterval {
                low: (roi - spread).max(0.0),
                high: roi + spread,
            },
            recommended_budget: budget,
            recommended_channels: ranked_channels,
            risk_factors,
            benchmark,
            created_at: Utc::now(),
        };

        self.predictions
            .insert_prediction(organization_id, prediction.clone())
            .await?;
        info!(
            campaign = %campaign_id,
            roi = prediction.predicted_roi,
            confidence,
            "forecast recorded"
        );
        Ok(prediction)
    }
}
