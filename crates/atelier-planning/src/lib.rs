//! # atelier-planning
//!
//! Turns a natural-language client request into an immutable execution plan:
//! classify the request, expand the literal ask into the scope it implies,
//! then allocate agents per phase from the registry.

mod builder;
mod classifier;

pub use builder::PlanBuilder;
pub use classifier::RequestClassifier;
