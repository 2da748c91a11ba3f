//! # atelier-quality
//!
//! The quality gate: soft scoring with suggestions, deterministic hard
//! validators that a high soft score can never override, and the auto-fix
//! flow that improves content and re-checks it as a new revision.

mod evaluator;
mod gate;
mod validators;

pub use evaluator::{Evaluator, HeuristicEvaluator, ProjectContext};
pub use gate::{AutoFixOutcome, QualityGate};
pub use validators::HardValidators;
