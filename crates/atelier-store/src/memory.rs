//! In-memory store backend
//!
//! Single `RwLock` over plain maps. Good enough for development, tests, and
//! single-node deployments; the traits keep a relational backend swappable.

use async_trait::async_trait;
use atelier_core::{
    AtelierError, Campaign, Deliverable, DeliverableStatus, InteractionRecord, MetadataPatch,
    ModificationRecord, Prediction, Project, Result, Workflow, WorkflowStatus,
};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::traits::{
    CampaignStore, DeliverableStore, MemoryStore, ModificationStore, PredictionStore,
    ProjectStore, WorkflowStore,
};

#[derive(Default)]
struct Inner {
    projects: HashMap<Uuid, Project>,
    deliverables: HashMap<Uuid, Deliverable>,
    workflows: HashMap<Uuid, Workflow>,
    campaigns: HashMap<Uuid, Campaign>,
    /// (organization_id, prediction), append-only
    predictions: Vec<(String, Prediction)>,
    modifications: Vec<ModificationRecord>,
    interactions: Vec<InteractionRecord>,
}

/// In-memory implementation of every store trait
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: &str, id: Uuid) -> AtelierError {
    AtelierError::NotFound(format!("{} {}", entity, id))
}

#[async_trait]
impl ProjectStore for MemStore {
    async fn insert_project(&self, project: Project) -> Result<()> {
        self.inner.write().await.projects.insert(project.id, project);
        Ok(())
    }

    async fn get_project(&self, organization_id: &str, id: Uuid) -> Result<Project> {
        let inner = self.inner.read().await;
        inner
            .projects
            .get(&id)
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| not_found("project", id))
    }

    async fn update_project(&self, mut project: Project) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.projects.contains_key(&project.id) {
            return Err(not_found("project", project.id));
        }
        project.updated_at = Utc::now();
        inner.projects.insert(project.id, project);
        Ok(())
    }
}

#[async_trait]
impl DeliverableStore for MemStore {
    async fn insert_deliverable(&self, deliverable: Deliverable) -> Result<()> {
        self.inner
            .write()
            .await
            .deliverables
            .insert(deliverable.id, deliverable);
        Ok(())
    }

    async fn get_deliverable(&self, organization_id: &str, id: Uuid) -> Result<Deliverable> {
        let inner = self.inner.read().await;
        inner
            .deliverables
            .get(&id)
            .filter(|d| d.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| not_found("deliverable", id))
    }

    async fn update_deliverable(&self, mut deliverable: Deliverable) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.deliverables.contains_key(&deliverable.id) {
            return Err(not_found("deliverable", deliverable.id));
        }
        deliverable.updated_at = Utc::now();
        inner.deliverables.insert(deliverable.id, deliverable);
        Ok(())
    }

    async fn find_by_assignment_key(
        &self,
        organization_id: &str,
        project_id: Uuid,
        assignment_key: &str,
    ) -> Result<Option<Deliverable>> {
        let inner = self.inner.read().await;
        Ok(inner
            .deliverables
            .values()
            .find(|d| {
                d.organization_id == organization_id
                    && d.project_id == project_id
                    && d.assignment_key == assignment_key
            })
            .cloned())
    }

    async fn list_for_project(
        &self,
        organization_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<Deliverable>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Deliverable> = inner
            .deliverables
            .values()
            .filter(|d| d.organization_id == organization_id && d.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.created_at);
        Ok(rows)
    }

    async fn merge_metadata(
        &self,
        organization_id: &str,
        id: Uuid,
        patch: MetadataPatch,
    ) -> Result<Deliverable> {
        let mut inner = self.inner.write().await;
        let deliverable = inner
            .deliverables
            .get_mut(&id)
            .filter(|d| d.organization_id == organization_id)
            .ok_or_else(|| not_found("deliverable", id))?;
        deliverable.metadata.merge(patch);
        deliverable.updated_at = Utc::now();
        Ok(deliverable.clone())
    }

    async fn set_status(
        &self,
        organization_id: &str,
        id: Uuid,
        status: DeliverableStatus,
    ) -> Result<Deliverable> {
        let mut inner = self.inner.write().await;
        let deliverable = inner
            .deliverables
            .get_mut(&id)
            .filter(|d| d.organization_id == organization_id)
            .ok_or_else(|| not_found("deliverable", id))?;

        if !deliverable.status.can_transition(status) {
            return Err(AtelierError::ModificationFailed(format!(
                "illegal status transition {} -> {}",
                deliverable.status, status
            )));
        }

        deliverable.status = status;
        deliverable.updated_at = Utc::now();
        Ok(deliverable.clone())
    }
}

#[async_trait]
impl WorkflowStore for MemStore {
    async fn insert_workflow(&self, workflow: Workflow) -> Result<()> {
        self.inner
            .write()
            .await
            .workflows
            .insert(workflow.id, workflow);
        Ok(())
    }

    async fn get_workflow(&self, organization_id: &str, id: Uuid) -> Result<Workflow> {
        let inner = self.inner.read().await;
        inner
            .workflows
            .get(&id)
            .filter(|w| w.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| not_found("workflow", id))
    }

    async fn update_workflow_status(
        &self,
        id: Uuid,
        status: WorkflowStatus,
        detail: Option<String>,
        result: Option<serde_json::Value>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let workflow = inner
            .workflows
            .get_mut(&id)
            .ok_or_else(|| not_found("workflow", id))?;
        workflow.status = status;
        if detail.is_some() {
            workflow.detail = detail;
        }
        if result.is_some() {
            workflow.result = result;
        }
        workflow.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl CampaignStore for MemStore {
    async fn insert_campaign(&self, campaign: Campaign) -> Result<()> {
        self.inner
            .write()
            .await
            .campaigns
            .insert(campaign.id, campaign);
        Ok(())
    }

    async fn get_campaign(&self, organization_id: &str, id: Uuid) -> Result<Campaign> {
        let inner = self.inner.read().await;
        inner
            .campaigns
            .get(&id)
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| AtelierError::CampaignNotFound(id.to_string()))
    }
}

#[async_trait]
impl PredictionStore for MemStore {
    async fn insert_prediction(
        &self,
        organization_id: &str,
        prediction: Prediction,
    ) -> Result<()> {
        self.inner
            .write()
            .await
            .predictions
            .push((organization_id.to_string(), prediction));
        Ok(())
    }

    async fn latest_for_campaign(
        &self,
        organization_id: &str,
        campaign_id: Uuid,
    ) -> Result<Option<Prediction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .predictions
            .iter()
            .filter(|(org, p)| org == organization_id && p.campaign_id == campaign_id)
            .max_by_key(|(_, p)| p.created_at)
            .map(|(_, p)| p.clone()))
    }
}

#[async_trait]
impl ModificationStore for MemStore {
    async fn append_modification(&self, record: ModificationRecord) -> Result<()> {
        self.inner.write().await.modifications.push(record);
        Ok(())
    }

    async fn modification_history(
        &self,
        deliverable_id: Uuid,
    ) -> Result<Vec<ModificationRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .modifications
            .iter()
            .filter(|m| m.deliverable_id == deliverable_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MemoryStore for MemStore {
    async fn record_interaction(&self, record: InteractionRecord) -> Result<()> {
        self.inner.write().await.interactions.push(record);
        Ok(())
    }

    async fn list_interactions(&self, organization_id: &str) -> Result<Vec<InteractionRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .interactions
            .iter()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect())
    }
}
