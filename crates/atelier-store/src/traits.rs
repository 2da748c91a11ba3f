//! Store trait definitions
//!
//! All reads are organization-scoped. An entity that exists but belongs to a
//! different organization is reported exactly like an absent one.

use async_trait::async_trait;
use atelier_core::{
    Campaign, Deliverable, DeliverableStatus, InteractionRecord, MetadataPatch,
    ModificationRecord, Prediction, Project, Result, Workflow, WorkflowStatus,
};
use uuid::Uuid;

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: Project) -> Result<()>;

    /// Organization-scoped fetch; `NotFound` for absent or cross-tenant ids
    async fn get_project(&self, organization_id: &str, id: Uuid) -> Result<Project>;

    async fn update_project(&self, project: Project) -> Result<()>;
}

#[async_trait]
pub trait DeliverableStore: Send + Sync {
    async fn insert_deliverable(&self, deliverable: Deliverable) -> Result<()>;

    /// Organization-scoped fetch; `NotFound` for absent or cross-tenant ids
    async fn get_deliverable(&self, organization_id: &str, id: Uuid) -> Result<Deliverable>;

    /// Full-row update (content, status, counters); metadata changes should
    /// go through [`DeliverableStore::merge_metadata`] instead
    async fn update_deliverable(&self, deliverable: Deliverable) -> Result<()>;

    /// Idempotency lookup: the deliverable previously produced for an
    /// assignment slot, if any
    async fn find_by_assignment_key(
        &self,
        organization_id: &str,
        project_id: Uuid,
        assignment_key: &str,
    ) -> Result<Option<Deliverable>>;

    async fn list_for_project(
        &self,
        organization_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<Deliverable>>;

    /// Section-level metadata merge patch; returns the updated row
    async fn merge_metadata(
        &self,
        organization_id: &str,
        id: Uuid,
        patch: MetadataPatch,
    ) -> Result<Deliverable>;

    /// Guarded status update; rejects illegal state-machine transitions
    async fn set_status(
        &self,
        organization_id: &str,
        id: Uuid,
        status: DeliverableStatus,
    ) -> Result<Deliverable>;
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn insert_workflow(&self, workflow: Workflow) -> Result<()>;

    async fn get_workflow(&self, organization_id: &str, id: Uuid) -> Result<Workflow>;

    /// Worker-side status update, keyed by id only (the worker owns the job)
    async fn update_workflow_status(
        &self,
        id: Uuid,
        status: WorkflowStatus,
        detail: Option<String>,
        result: Option<serde_json::Value>,
    ) -> Result<()>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: Campaign) -> Result<()>;

    /// `CampaignNotFound` for absent or cross-tenant ids
    async fn get_campaign(&self, organization_id: &str, id: Uuid) -> Result<Campaign>;
}

#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Predictions are append-only; later rows supersede earlier ones
    async fn insert_prediction(&self, organization_id: &str, prediction: Prediction)
        -> Result<()>;

    async fn latest_for_campaign(
        &self,
        organization_id: &str,
        campaign_id: Uuid,
    ) -> Result<Option<Prediction>>;
}

#[async_trait]
pub trait ModificationStore: Send + Sync {
    async fn append_modification(&self, record: ModificationRecord) -> Result<()>;

    async fn modification_history(&self, deliverable_id: Uuid) -> Result<Vec<ModificationRecord>>;
}

/// Long-term interaction memory consumed by the learning loop
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn record_interaction(&self, record: InteractionRecord) -> Result<()>;

    async fn list_interactions(&self, organization_id: &str) -> Result<Vec<InteractionRecord>>;
}
