//! Approval gate and publication strategies

use atelier_core::config::PublishConfig;
use atelier_core::{
    ApprovalInfo, AtelierError, Deliverable, DeliverableStatus, InteractionRecord,
    InteractionType, MetadataPatch, PublishState, Result,
};
use atelier_engine::{WorkflowJob, WorkflowQueue};
use atelier_insight::FeedbackRecorder;
use atelier_store::DeliverableStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::integration::DirectIntegration;

/// How a publish request resolved
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Live immediately at a URL
    Published { url: String },
    /// Queued for out-of-band publication
    Deferred { workflow_id: Uuid },
}

/// Caller-supplied publish options
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Scheduled publication time; any value routes through a workflow
    pub when: Option<DateTime<Utc>>,
    /// Extra metadata merged into the deliverable alongside the publish state
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

pub struct PublishController {
    deliverables: Arc<dyn DeliverableStore>,
    recorder: FeedbackRecorder,
    queue: WorkflowQueue,
    integrations: HashMap<String, Arc<dyn DirectIntegration>>,
    config: PublishConfig,
}

impl PublishController {
    pub fn new(
        deliverables: Arc<dyn DeliverableStore>,
        recorder: FeedbackRecorder,
        queue: WorkflowQueue,
        config: PublishConfig,
    ) -> Self {
        Self {
            deliverables,
            recorder,
            queue,
            integrations: HashMap::new(),
            config,
        }
    }

    pub fn with_integration(mut self, integration: Arc<dyn DirectIntegration>) -> Self {
        self.integrations
            .insert(integration.target().to_string(), integration);
        self
    }

    /// Approve a deliverable, optionally chaining straight into publish
    ///
    /// Rejected while a revision is in flight: the reviewer must look at the
    /// content that will actually ship.
    pub async fn approve(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        approver_id: &str,
        feedback: Option<String>,
        auto_publish_target: Option<String>,
    ) -> Result<(Deliverable, Option<PublishOutcome>)> {
        let deliverable = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        if deliverable.status == DeliverableStatus::Revising {
            return Err(AtelierError::ModificationFailed(format!(
                "deliverable {} has a revision in flight",
                deliverable_id
            )));
        }

        self.deliverables
            .set_status(organization_id, deliverable_id, DeliverableStatus::Approved)
            .await?;
        let approved = self
            .deliverables
            .merge_metadata(
                organization_id,
                deliverable_id,
                MetadataPatch::new().with_approval(ApprovalInfo {
                    approver_id: approver_id.to_string(),
                    feedback: feedback.clone(),
                    approved_at: Utc::now(),
                }),
            )
            .await?;

        info!(deliverable = %deliverable_id, approver = approver_id, "deliverable approved");
        self.record_feedback(
            &approved,
            InteractionType::Approval,
            "approved",
            feedback.unwrap_or_default(),
        );

        let publish_outcome = match auto_publish_target {
            Some(target) => Some(
                self.publish(
                    organization_id,
                    deliverable_id,
                    &target,
                    PublishOptions::default(),
                )
                .await?,
            ),
            None => None,
        };
        Ok((approved, publish_outcome))
    }

    /// Publish an approved deliverable to a target
    ///
    /// Strategy per target:
    /// - a scheduled `when`: always deferred, whatever the target
    /// - `hosted`: immediately live under the platform's own base URL
    /// - a registered direct integration: attempted inline; an integration
    ///   error falls back to a deferred workflow and still succeeds
    /// - anything else: always deferred
    pub async fn publish(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        target: &str,
        options: PublishOptions,
    ) -> Result<PublishOutcome> {
        let deliverable = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        if deliverable.status != DeliverableStatus::Approved {
            return Err(AtelierError::PublishFailed(format!(
                "deliverable {} is {}, only approved deliverables publish",
                deliverable_id, deliverable.status
            )));
        }

        let outcome = if let Some(at) = options.when {
            self.defer(organization_id, deliverable_id, target, Some(at))
                .await?
        } else if target == "hosted" {
            let url = format!(
                "{}/{}/{}",
                self.config.hosted_base_url, organization_id, deliverable_id
            );
            PublishOutcome::Published { url }
        } else if let Some(integration) = self.integrations.get(target) {
            match integration.publish(&deliverable).await {
                Ok(url) => PublishOutcome::Published { url },
                Err(AtelierError::Integration(detail)) => {
                    warn!(
                        deliverable = %deliverable_id,
                        target,
                        detail,
                        "direct integration failed, deferring to workflow"
                    );
                    self.defer(organization_id, deliverable_id, target, None)
                        .await?
                }
                Err(e) => return Err(e),
            }
        } else {
            self.defer(organization_id, deliverable_id, target, None)
                .await?
        };

        // Every attempt leaves a publish-state trail, deferred ones included
        let (url, workflow_id) = match &outcome {
            PublishOutcome::Published { url } => (Some(url.clone()), None),
            PublishOutcome::Deferred { workflow_id } => (None, Some(*workflow_id)),
        };
        let mut patch = MetadataPatch::new().with_publish(PublishState {
            target: target.to_string(),
            url: url.clone(),
            workflow_id,
            at: Utc::now(),
        });
        for (key, value) in options.metadata {
            patch = patch.with_extra(key, value);
        }
        self.deliverables
            .merge_metadata(organization_id, deliverable_id, patch)
            .await?;

        if let PublishOutcome::Published { url } = &outcome {
            self.deliverables
                .set_status(organization_id, deliverable_id, DeliverableStatus::Published)
                .await?;
            info!(deliverable = %deliverable_id, target, url, "deliverable published");
            self.record_feedback(
                &deliverable,
                InteractionType::Publication,
                "published",
                url.clone(),
            );
        }

        Ok(outcome)
    }

    async fn defer(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        target: &str,
        when: Option<DateTime<Utc>>,
    ) -> Result<PublishOutcome> {
        let org = organization_id.to_string();
        let target_owned = target.to_string();
        let detail = match when {
            Some(at) => format!(
                "Publish deliverable {} to {} at {}",
                deliverable_id,
                target,
                at.to_rfc3339()
            ),
            None => format!("Publish deliverable {} to {}", deliverable_id, target),
        };
        let workflow_id = self
            .queue
            .enqueue(
                organization_id,
                detail,
                |workflow_id| WorkflowJob::Publish {
                    workflow_id,
                    organization_id: org,
                    deliverable_id,
                    target: target_owned,
                },
            )
            .await?;
        Ok(PublishOutcome::Deferred { workflow_id })
    }

    /// Detached feedback-loop write; never blocks or fails the caller
    fn record_feedback(
        &self,
        deliverable: &Deliverable,
        interaction_type: InteractionType,
        outcome: &str,
        feedback_content: String,
    ) {
        self.recorder.record_detached(InteractionRecord {
            organization_id: deliverable.organization_id.clone(),
            interaction_type,
            outcome: outcome.to_string(),
            deliverable_id: deliverable.id,
            campaign_id: deliverable.campaign_id,
            original_content: deliverable.content.clone(),
            feedback_content,
            iteration_count: deliverable.iteration_count,
            created_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atelier_core::DeliverableType;
    use atelier_engine::WorkflowHandler;
    use atelier_store::{MemStore, WorkflowStore};
    use serde_json::json;

    struct NoopHandler;

    #[async_trait]
    impl WorkflowHandler for NoopHandler {
        async fn handle(&self, _job: WorkflowJob) -> Result<serde_json::Value> {
            Ok(json!({}))
        }
    }

    /// Integration that always reports the third party as down
    struct DownIntegration;

    #[async_trait]
    impl DirectIntegration for DownIntegration {
        fn target(&self) -> &str {
            "webflow"
        }

        async fn publish(&self, _deliverable: &Deliverable) -> Result<String> {
            Err(AtelierError::Integration("connection refused".to_string()))
        }
    }

    struct UpIntegration;

    #[async_trait]
    impl DirectIntegration for UpIntegration {
        fn target(&self) -> &str {
            "webflow"
        }

        async fn publish(&self, deliverable: &Deliverable) -> Result<String> {
            Ok(format!("https://site.webflow.io/{}", deliverable.id))
        }
    }

    fn controller(store: Arc<MemStore>) -> PublishController {
        let queue = WorkflowQueue::start(store.clone(), Arc::new(NoopHandler));
        PublishController::new(
            store.clone(),
            FeedbackRecorder::new(store.clone()),
            queue,
            PublishConfig::default(),
        )
    }

    async fn seeded(store: &MemStore) -> Deliverable {
        let d = Deliverable::new(
            Uuid::new_v4(),
            "org-a",
            "plan/creation/copywriter/0",
            DeliverableType::LandingPage,
            "Landing page copy for the launch.",
        );
        store.insert_deliverable(d.clone()).await.unwrap();
        d
    }

    #[tokio::test]
    async fn test_approve_records_approver_and_feedback() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone());

        let (approved, publish) = ctl
            .approve("org-a", d.id, "reviewer-1", Some("ship it".to_string()), None)
            .await
            .unwrap();

        assert!(publish.is_none());
        assert_eq!(approved.status, DeliverableStatus::Approved);
        let approval = approved.metadata.approval.unwrap();
        assert_eq!(approval.approver_id, "reviewer-1");
        assert_eq!(approval.feedback.as_deref(), Some("ship it"));
    }

    #[tokio::test]
    async fn test_approve_rejected_while_revision_in_flight() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        store
            .set_status("org-a", d.id, DeliverableStatus::Revising)
            .await
            .unwrap();
        let ctl = controller(store);

        let err = ctl
            .approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "MODIFICATION_FAILED");
    }

    #[tokio::test]
    async fn test_hosted_publish_is_immediate() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone());

        ctl.approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap();
        let outcome = ctl.publish("org-a", d.id, "hosted", PublishOptions::default()).await.unwrap();

        let url = match outcome {
            PublishOutcome::Published { url } => url,
            other => panic!("expected immediate publication, got {:?}", other),
        };
        assert!(url.contains(&d.id.to_string()));

        let reloaded = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(reloaded.status, DeliverableStatus::Published);
        let publish = reloaded.metadata.publish.unwrap();
        assert_eq!(publish.target, "hosted");
        assert_eq!(publish.url, Some(url));
    }

    #[tokio::test]
    async fn test_unapproved_publish_is_rejected() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store);

        let err = ctl.publish("org-a", d.id, "hosted", PublishOptions::default()).await.unwrap_err();
        assert_eq!(err.code(), "PUBLISH_FAILED");
    }

    #[tokio::test]
    async fn test_failing_integration_falls_back_to_workflow() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone()).with_integration(Arc::new(DownIntegration));

        ctl.approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap();
        let outcome = ctl.publish("org-a", d.id, "webflow", PublishOptions::default()).await.unwrap();

        let workflow_id = match outcome {
            PublishOutcome::Deferred { workflow_id } => workflow_id,
            other => panic!("expected deferred publication, got {:?}", other),
        };
        // Workflow row exists and publish metadata points at it
        store.get_workflow("org-a", workflow_id).await.unwrap();
        let reloaded = store.get_deliverable("org-a", d.id).await.unwrap();
        let publish = reloaded.metadata.publish.unwrap();
        assert_eq!(publish.workflow_id, Some(workflow_id));
        assert!(publish.url.is_none());
        // Deferred: not yet published
        assert_eq!(reloaded.status, DeliverableStatus::Approved);
    }

    #[tokio::test]
    async fn test_healthy_integration_publishes_directly() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone()).with_integration(Arc::new(UpIntegration));

        ctl.approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap();
        let outcome = ctl.publish("org-a", d.id, "webflow", PublishOptions::default()).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::Published { .. }));
        let reloaded = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(reloaded.status, DeliverableStatus::Published);
    }

    #[tokio::test]
    async fn test_unknown_target_always_defers() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone());

        ctl.approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap();
        let outcome = ctl.publish("org-a", d.id, "instagram", PublishOptions::default()).await.unwrap();
        assert!(matches!(outcome, PublishOutcome::Deferred { .. }));
    }

    #[tokio::test]
    async fn test_approve_with_chained_publish() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone());

        let (_, publish) = ctl
            .approve("org-a", d.id, "reviewer-1", None, Some("hosted".to_string()))
            .await
            .unwrap();

        assert!(matches!(publish, Some(PublishOutcome::Published { .. })));
        let reloaded = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(reloaded.status, DeliverableStatus::Published);
    }

    #[tokio::test]
    async fn test_scheduled_publish_defers_even_for_hosted() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone());

        ctl.approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap();
        let when = Utc::now() + chrono::Duration::hours(2);
        let outcome = ctl
            .publish(
                "org-a",
                d.id,
                "hosted",
                PublishOptions {
                    when: Some(when),
                    metadata: Default::default(),
                },
            )
            .await
            .unwrap();

        let workflow_id = match outcome {
            PublishOutcome::Deferred { workflow_id } => workflow_id,
            other => panic!("expected deferred publication, got {:?}", other),
        };
        let workflow = store.get_workflow("org-a", workflow_id).await.unwrap();
        assert!(workflow.detail.unwrap().contains(&when.to_rfc3339()));
        // Scheduled: not live yet
        let reloaded = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(reloaded.status, DeliverableStatus::Approved);
    }

    #[tokio::test]
    async fn test_publish_metadata_merges_into_extra() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store.clone());

        ctl.approve("org-a", d.id, "reviewer-1", None, None)
            .await
            .unwrap();
        let mut metadata = serde_json::Map::new();
        metadata.insert("locale".to_string(), json!("en-US"));
        ctl.publish(
            "org-a",
            d.id,
            "hosted",
            PublishOptions {
                when: None,
                metadata,
            },
        )
        .await
        .unwrap();

        let reloaded = store.get_deliverable("org-a", d.id).await.unwrap();
        assert_eq!(reloaded.metadata.extra["locale"], json!("en-US"));
        assert_eq!(reloaded.metadata.publish.unwrap().target, "hosted");
    }

    #[tokio::test]
    async fn test_cross_tenant_publish_is_not_found() {
        let store = Arc::new(MemStore::new());
        let d = seeded(&store).await;
        let ctl = controller(store);

        let err = ctl.publish("org-b", d.id, "hosted", PublishOptions::default()).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
