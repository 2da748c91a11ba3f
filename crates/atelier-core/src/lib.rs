//! # atelier-core
//!
//! Core types for the Atelier deliverable orchestration pipeline.
//!
//! Atelier turns a natural-language client request into an execution plan of
//! phases and agent assignments, executes that plan into deliverables, gates
//! deliverable quality, and tracks each deliverable through revision,
//! approval, and publication.
//!
//! ## Core paradigm
//!
//! - The Deliverable row is the unit of mutation
//! - Metadata updates are section-level merge patches, never full overwrites
//! - Plans are immutable once execution starts; re-planning creates a new plan
//! - Side-effect recording (audit, feedback) is fail-open and never blocks
//!   the primary write

pub mod config;
pub mod fail_open;

mod error;
mod metadata;
mod types;

pub use error::{AtelierError, Result};
pub use metadata::*;
pub use types::*;
