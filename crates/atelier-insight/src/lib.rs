//! # atelier-insight
//!
//! The learning loop: detached feedback recording into the interaction
//! memory store, deterministic campaign forecasting against channel
//! benchmarks, and creative-variant ranking.

mod forecast;
mod ranking;
mod recorder;

pub use forecast::Forecaster;
pub use ranking::{RankedVariant, VariantInput, VariantRanker, VariantScores};
pub use recorder::FeedbackRecorder;
