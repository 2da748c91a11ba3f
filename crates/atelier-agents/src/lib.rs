//! # atelier-agents
//!
//! Static agent registry plus the content-generation seam. The registry is a
//! pure catalog of agent definitions the plan builder allocates from; the
//! [`AgentInvoker`] trait is the opaque collaborator that actually produces
//! deliverable content.

mod invoker;
mod registry;

pub use invoker::{AgentBrief, AgentInvoker, AgentOutput, TemplateInvoker};
pub use registry::{AgentCategory, AgentDefinition, AgentRegistry};
