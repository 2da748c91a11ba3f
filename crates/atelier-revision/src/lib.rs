//! # atelier-revision
//!
//! The modification service: direct (synchronous, bounded-latency) edits and
//! workflow (queued) revisions, with per-deliverable locking so a deliverable
//! has at most one revision in flight.

mod locks;
mod service;

pub use locks::RevisionLocks;
pub use service::{ModificationOutcome, ModificationService};
