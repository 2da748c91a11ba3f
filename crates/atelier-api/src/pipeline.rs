//! Background workflow processing
//!
//! [`PipelineHandler`] is the worker behind the workflow queue: queued
//! revisions re-enter the content pipeline, deferred publishes land their
//! publish state, and variant generation fans a deliverable out into aspect
//! variants and ranks them.

use async_trait::async_trait;
use atelier_core::config::PublishConfig;
use atelier_core::{
    AtelierError, Deliverable, DeliverableStatus, MetadataPatch, PublishState, Result,
    RevisionLineage,
};
use atelier_engine::{WorkflowHandler, WorkflowJob};
use atelier_insight::{VariantInput, VariantRanker};
use atelier_quality::{Evaluator, ProjectContext};
use atelier_store::{DeliverableStore, ProjectStore};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Variant aspect packs: the angle each aspect layers onto the base content
fn aspect_angle(aspect: &str) -> String {
    match aspect {
        "urgency" => "Limited window: the launch pricing ends soon, act now.".to_string(),
        "social-proof" => "Teams across the industry already rely on this.".to_string(),
        "benefit" => "Lead with the outcome: what the reader gains on day one.".to_string(),
        "curiosity" => "Open a loop: what most teams get wrong about this.".to_string(),
        other => format!("Angle: {}.", other),
    }
}

/// Named aspect packs a caller can request instead of listing aspects
pub fn pack_aspects(pack: &str) -> Option<&'static [&'static str]> {
    match pack {
        "launch" => Some(&["urgency", "benefit"]),
        "awareness" => Some(&["curiosity", "social-proof"]),
        "conversion" => Some(&["urgency", "social-proof", "benefit"]),
        _ => None,
    }
}

pub struct PipelineHandler {
    deliverables: Arc<dyn DeliverableStore>,
    projects: Arc<dyn ProjectStore>,
    evaluator: Arc<dyn Evaluator>,
    ranker: VariantRanker,
    publish_config: PublishConfig,
}

impl PipelineHandler {
    pub fn new(
        deliverables: Arc<dyn DeliverableStore>,
        projects: Arc<dyn ProjectStore>,
        evaluator: Arc<dyn Evaluator>,
        ranker: VariantRanker,
        publish_config: PublishConfig,
    ) -> Self {
        Self {
            deliverables,
            projects,
            evaluator,
            ranker,
            publish_config,
        }
    }

    async fn context_for(&self, organization_id: &str, deliverable: &Deliverable) -> ProjectContext {
        match self
            .projects
            .get_project(organization_id, deliverable.project_id)
            .await
        {
            Ok(project) => ProjectContext::new(project.request),
            Err(_) => ProjectContext::default(),
        }
    }

    async fn handle_revision(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        goal: &str,
    ) -> Result<serde_json::Value> {
        let original = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        let ctx = self.context_for(organization_id, &original).await;
        let goals = vec![goal.to_string()];
        let revised = self
            .evaluator
            .improve(&original.content, &goals, &ctx)
            .await
            .map_err(|e| AtelierError::RevisionFailed(e.to_string()))?;

        let mut revision = Deliverable::new(
            original.project_id,
            original.organization_id.clone(),
            format!("{}#wf-{}", original.assignment_key, Uuid::new_v4()),
            original.deliverable_type,
            revised,
        );
        revision.campaign_id = original.campaign_id;
        revision.iteration_count = original.iteration_count + 1;
        revision.metadata.merge(
            MetadataPatch::new().with_revision(RevisionLineage {
                revision_of: Some(original.id),
                last_revision_id: None,
            }),
        );
        self.deliverables.insert_deliverable(revision.clone()).await?;
        self.deliverables
            .merge_metadata(
                organization_id,
                original.id,
                MetadataPatch::new().with_revision(RevisionLineage {
                    revision_of: original
                        .metadata
                        .revision
                        .as_ref()
                        .and_then(|r| r.revision_of),
                    last_revision_id: Some(revision.id),
                }),
            )
            .await?;

        info!(original = %original.id, revision = %revision.id, "workflow revision landed");
        Ok(json!({ "newDeliverableId": revision.id }))
    }

    async fn handle_publish(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        target: &str,
    ) -> Result<serde_json::Value> {
        let deliverable = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        if deliverable.status != DeliverableStatus::Approved {
            return Err(AtelierError::PublishFailed(format!(
                "deliverable {} is {}, deferred publish needs an approved deliverable",
                deliverable_id, deliverable.status
            )));
        }

        let url = format!(
            "{}/{}/{}/{}",
            self.publish_config.hosted_base_url, target, organization_id, deliverable_id
        );
        self.deliverables
            .merge_metadata(
                organization_id,
                deliverable_id,
                MetadataPatch::new().with_publish(PublishState {
                    target: target.to_string(),
                    url: Some(url.clone()),
                    workflow_id: None,
                    at: Utc::now(),
                }),
            )
            .await?;
        self.deliverables
            .set_status(organization_id, deliverable_id, DeliverableStatus::Published)
            .await?;

        info!(deliverable = %deliverable_id, target, "deferred publish landed");
        Ok(json!({ "url": url }))
    }

    async fn handle_variants(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        aspects: &[String],
    ) -> Result<serde_json::Value> {
        if aspects.is_empty() {
            return Err(AtelierError::InvalidInput(
                "variant generation requires at least one aspect".to_string(),
            ));
        }
        let original = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        if original.deliverable_type.is_binary() {
            return Err(AtelierError::Unsupported(format!(
                "variant generation does not support binary deliverables ({})",
                original.deliverable_type
            )));
        }
        let ctx = self.context_for(organization_id, &original).await;

        let mut stored = Vec::with_capacity(aspects.len());
        for aspect in aspects {
            let content = format!("{}\n\n{}", original.content, aspect_angle(aspect));
            let mut variant = Deliverable::new(
                original.project_id,
                original.organization_id.clone(),
                format!("{}#var-{}", original.assignment_key, aspect),
                original.deliverable_type,
                content,
            );
            variant.campaign_id = original.campaign_id;
            variant.metadata.merge(
                MetadataPatch::new().with_revision(RevisionLineage {
                    revision_of: Some(original.id),
                    last_revision_id: None,
                }),
            );
            self.deliverables.insert_deliverable(variant.clone()).await?;
            stored.push(variant);
        }

        // A single aspect cannot be ranked against itself
        let ranking = if stored.len() >= 2 {
            let inputs: Vec<VariantInput> = stored
                .iter()
                .map(|v| VariantInput {
                    deliverable_id: Some(v.id),
                    content: v.content.clone(),
                })
                .collect();
            Some(self.ranker.rank(&inputs, &ctx.request)?)
        } else {
            None
        };

        info!(
            original = %original.id,
            variants = stored.len(),
            "variant generation complete"
        );
        Ok(json!({
            "variantIds": stored.iter().map(|v| v.id).collect::<Vec<_>>(),
            "ranking": ranking,
        }))
    }
}

#[async_trait]
impl WorkflowHandler for PipelineHandler {
    async fn handle(&self, job: WorkflowJob) -> Result<serde_json::Value> {
        match job {
            WorkflowJob::Revision {
                organization_id,
                deliverable_id,
                goal,
                ..
            } => {
                self.handle_revision(&organization_id, deliverable_id, &goal)
                    .await
            }
            WorkflowJob::Publish {
                organization_id,
                deliverable_id,
                target,
                ..
            } => {
                self.handle_publish(&organization_id, deliverable_id, &target)
                    .await
            }
            WorkflowJob::VariantGeneration {
                organization_id,
                deliverable_id,
                aspects,
                ..
            } => {
                self.handle_variants(&organization_id, deliverable_id, &aspects)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{ClientRequest, DeliverableType, Project};
    use atelier_quality::HeuristicEvaluator;
    use atelier_store::MemStore;

    fn handler(store: Arc<MemStore>) -> PipelineHandler {
        PipelineHandler::new(
            store.clone(),
            store,
            Arc::new(HeuristicEvaluator::default()),
            VariantRanker::default(),
            PublishConfig::default(),
        )
    }

    async fn seeded(store: &MemStore) -> Deliverable {
        let project = Project::new(
            "org-a",
            &ClientRequest::new("Drive signups for the analytics platform", "client-1"),
        );
        let d = Deliverable::new(
            project.id,
            "org-a",
            "plan/creation/copywriter/0",
            DeliverableType::AdCopy,
            "Try the analytics platform and see every metric that matters.",
        );
        store.insert_project(project).await.unwrap();
        store.insert_deliverable(d.clone()).await.unwrap();
        d
    }

    #[tokio::test]
    async fn test_revision_job_lands_linked_revision() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let handler = handler(store.clone());

        let result = handler
            .handle(WorkflowJob::Revision {
                workflow_id: Uuid::new_v4(),
                organization_id: "org-a".to_string(),
                deliverable_id: d.id,
                goal: "Add a stronger call to action".to_string(),
            })
            .await
            .unwrap();

        let new_id: Uuid =
            serde_json::from_value(result["newDeliverableId"].clone()).unwrap();
        let revision = store.get_deliverable("org-a", new_id).await.unwrap();
        assert_eq!(revision.iteration_count, 1);
        assert_eq!(
            revision.metadata.revision.as_ref().unwrap().revision_of,
            Some(d.id)
        );
        let original = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(original.metadata.last_revision_id(), Some(new_id));
    }

    #[tokio::test]
    async fn test_publish_job_requires_approval() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let handler = handler(store.clone());

        let err = handler
            .handle(WorkflowJob::Publish {
                workflow_id: Uuid::new_v4(),
                organization_id: "org-a".to_string(),
                deliverable_id: d.id,
                target: "instagram".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PUBLISH_FAILED");

        store
            .set_status("org-a", d.id, DeliverableStatus::Approved)
            .await
            .unwrap();
        let result = handler
            .handle(WorkflowJob::Publish {
                workflow_id: Uuid::new_v4(),
                organization_id: "org-a".to_string(),
                deliverable_id: d.id,
                target: "instagram".to_string(),
            })
            .await
            .unwrap();
        assert!(result["url"].as_str().unwrap().contains("instagram"));

        let published = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(published.status, DeliverableStatus::Published);
    }

    #[tokio::test]
    async fn test_variant_job_generates_and_ranks() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let handler = handler(store.clone());

        let result = handler
            .handle(WorkflowJob::VariantGeneration {
                workflow_id: Uuid::new_v4(),
                organization_id: "org-a".to_string(),
                deliverable_id: d.id,
                aspects: vec!["urgency".to_string(), "social-proof".to_string()],
            })
            .await
            .unwrap();

        let ids: Vec<Uuid> = serde_json::from_value(result["variantIds"].clone()).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(result["ranking"].is_array());
        for id in ids {
            let variant = store.get_deliverable("org-a", id).await.unwrap();
            assert_eq!(
                variant.metadata.revision.as_ref().unwrap().revision_of,
                Some(d.id)
            );
        }
    }

    #[test]
    fn test_known_packs_expand_to_aspects() {
        assert_eq!(pack_aspects("launch"), Some(&["urgency", "benefit"][..]));
        assert_eq!(
            pack_aspects("conversion"),
            Some(&["urgency", "social-proof", "benefit"][..])
        );
        assert_eq!(pack_aspects("retro"), None);
    }

    #[tokio::test]
    async fn test_variant_job_rejects_binary_original() {
        let store = Arc::new(MemStore::new());
        let d = Deliverable::new(
            Uuid::new_v4(),
            "org-a",
            "plan/creation/art-director/0",
            DeliverableType::Image,
            "asset://image/art-director",
        );
        store.insert_deliverable(d.clone()).await.unwrap();
        let handler = handler(store);

        let err = handler
            .handle(WorkflowJob::VariantGeneration {
                workflow_id: Uuid::new_v4(),
                organization_id: "org-a".to_string(),
                deliverable_id: d.id,
                aspects: vec!["urgency".to_string()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED");
    }
}
