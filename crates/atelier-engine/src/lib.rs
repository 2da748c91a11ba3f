//! # atelier-engine
//!
//! Walks an execution plan phase-by-phase, dispatching agent assignments
//! concurrently within each phase, and hosts the background workflow queue
//! that processes deferred (workflow-mode) jobs.

mod executor;
mod workflow;

pub use executor::{ExecutionReport, ExecutionStatus, Executor, PhaseReport};
pub use workflow::{WorkflowHandler, WorkflowJob, WorkflowQueue};
