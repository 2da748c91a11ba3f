//! # atelier-publish
//!
//! Approval and publication: the approval gate (with optional chained
//! publish) and per-target publication strategies. The directly integrated
//! target falls back to a queued workflow job when the integration errors,
//! so a flaky third party degrades to deferred publication instead of a
//! failed request.

mod controller;
mod integration;

pub use controller::{PublishController, PublishOptions, PublishOutcome};
pub use integration::{DirectIntegration, WebflowIntegration};
