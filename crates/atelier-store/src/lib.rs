//! # atelier-store
//!
//! Async store traits for every persisted entity, plus the in-memory
//! implementation. Ownership scoping is baked into the traits: every read
//! takes the caller's organization and misses resolve to `NOT_FOUND`, so a
//! cross-tenant id never leaks existence.

mod memory;
mod traits;

pub use memory::MemStore;
pub use traits::{
    CampaignStore, DeliverableStore, MemoryStore, ModificationStore, PredictionStore,
    ProjectStore, WorkflowStore,
};
