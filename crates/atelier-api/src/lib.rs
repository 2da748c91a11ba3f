//! # atelier-api
//!
//! The HTTP surface and composition root: wires stores, the plan builder,
//! the execution engine, the quality gate, modification and publication
//! services, and the insight loop into one axum application.

mod error;
mod identity;
mod pipeline;
mod routes;
mod server;
mod state;

pub use error::{ApiError, ApiResult};
pub use identity::Caller;
pub use pipeline::PipelineHandler;
pub use server::serve;
pub use state::{AppState, SharedState};
