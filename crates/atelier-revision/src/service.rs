//! The modification service
//!
//! Direct mode transforms content synchronously under a latency bound and
//! lands a new revision deliverable. Workflow mode enqueues a revision job
//! and returns its workflow id. Validation always precedes side effects:
//! a rejected request leaves no audit or feedback record behind.

use atelier_core::config::RevisionConfig;
use atelier_core::fail_open::fail_open;
use atelier_core::{
    AtelierError, Deliverable, DeliverableStatus, InteractionRecord, InteractionType,
    MetadataPatch, ModificationMode, ModificationRecord, Result, RevisionLineage,
};
use atelier_engine::{WorkflowJob, WorkflowQueue};
use atelier_insight::FeedbackRecorder;
use atelier_quality::{Evaluator, ProjectContext};
use atelier_store::{DeliverableStore, ModificationStore, ProjectStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;
use uuid::Uuid;

/// What a modification request resolved to
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModificationOutcome {
    Revised {
        original_id: Uuid,
        new_deliverable: Deliverable,
    },
    Queued {
        workflow_id: Uuid,
    },
}

pub struct ModificationService {
    deliverables: Arc<dyn DeliverableStore>,
    projects: Arc<dyn ProjectStore>,
    modifications: Arc<dyn ModificationStore>,
    recorder: FeedbackRecorder,
    evaluator: Arc<dyn Evaluator>,
    queue: WorkflowQueue,
    locks: crate::RevisionLocks,
    config: RevisionConfig,
}

impl ModificationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        deliverables: Arc<dyn DeliverableStore>,
        projects: Arc<dyn ProjectStore>,
        modifications: Arc<dyn ModificationStore>,
        recorder: FeedbackRecorder,
        evaluator: Arc<dyn Evaluator>,
        queue: WorkflowQueue,
        config: RevisionConfig,
    ) -> Self {
        Self {
            deliverables,
            projects,
            modifications,
            recorder,
            evaluator,
            queue,
            locks: crate::RevisionLocks::new(),
            config,
        }
    }

    /// Apply a modification instruction in the requested mode
    pub async fn modify(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        instruction: &str,
        mode: ModificationMode,
        actor_id: &str,
    ) -> Result<ModificationOutcome> {
        // Reject before any lock, status change, or record is taken
        if instruction.trim().is_empty() {
            return Err(AtelierError::InvalidInput(
                "modification instruction must not be empty".to_string(),
            ));
        }

        match mode {
            ModificationMode::Direct => {
                self.modify_direct(organization_id, deliverable_id, instruction, actor_id)
                    .await
            }
            ModificationMode::Workflow => {
                self.modify_workflow(organization_id, deliverable_id, instruction, actor_id)
                    .await
            }
        }
    }

    async fn modify_direct(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        instruction: &str,
        actor_id: &str,
    ) -> Result<ModificationOutcome> {
        let original = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        if original.deliverable_type.is_binary() {
            return Err(AtelierError::Unsupported(format!(
                "direct modification does not support binary deliverables ({})",
                original.deliverable_type
            )));
        }

        // One revision in flight per deliverable; released on every exit path
        let _guard = self.locks.acquire(deliverable_id)?;
        self.deliverables
            .set_status(organization_id, deliverable_id, DeliverableStatus::Revising)
            .await?;

        let ctx = self.context_for(organization_id, &original).await;
        let budget = Duration::from_millis(self.config.direct_timeout_ms);
        let instructions = vec![instruction.to_string()];
        let transformed = match timeout(
            budget,
            self.evaluator.improve(&original.content, &instructions, &ctx),
        )
        .await
        {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                self.restore_draft(organization_id, deliverable_id).await;
                return Err(AtelierError::ModificationFailed(e.to_string()));
            }
            Err(_) => {
                self.restore_draft(organization_id, deliverable_id).await;
                return Err(AtelierError::ModificationFailed(format!(
                    "direct modification exceeded {}ms",
                    self.config.direct_timeout_ms
                )));
            }
        };

        let mut revision = Deliverable::new(
            original.project_id,
            original.organization_id.clone(),
            format!("{}#rev-{}", original.assignment_key, Uuid::new_v4()),
            original.deliverable_type,
            transformed,
        );
        revision.campaign_id = original.campaign_id;
        revision.iteration_count = original.iteration_count + 1;
        revision.metadata.merge(
            MetadataPatch::new().with_revision(RevisionLineage {
                revision_of: Some(original.id),
                last_revision_id: None,
            }),
        );
        // The deliverable went to revising above; any failure landing the
        // revision must put it back in draft before the error surfaces
        if let Err(e) = self.land_revision(organization_id, &original, &revision).await {
            self.restore_draft(organization_id, deliverable_id).await;
            return Err(e);
        }

        info!(
            deliverable = %deliverable_id,
            revision = %revision.id,
            actor = actor_id,
            "direct modification applied"
        );

        self.record_audit(
            ModificationRecord::new(
                deliverable_id,
                instruction,
                ModificationMode::Direct,
                actor_id,
                "revised",
            )
            .with_new_deliverable(revision.id),
        )
        .await;
        self.record_feedback(&original, instruction, &revision.content);

        Ok(ModificationOutcome::Revised {
            original_id: original.id,
            new_deliverable: revision,
        })
    }

    async fn modify_workflow(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        instruction: &str,
        actor_id: &str,
    ) -> Result<ModificationOutcome> {
        // Ownership check up front so a cross-tenant id never enqueues work
        let original = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;

        let goal = format!(
            "Revise the {} to satisfy: {}",
            original.deliverable_type, instruction
        );
        let org = organization_id.to_string();
        let workflow_id = self
            .queue
            .enqueue(organization_id, goal.clone(), |workflow_id| {
                WorkflowJob::Revision {
                    workflow_id,
                    organization_id: org,
                    deliverable_id,
                    goal,
                }
            })
            .await?;

        info!(
            deliverable = %deliverable_id,
            workflow = %workflow_id,
            actor = actor_id,
            "revision workflow queued"
        );

        self.record_audit(ModificationRecord::new(
            deliverable_id,
            instruction,
            ModificationMode::Workflow,
            actor_id,
            "queued",
        ))
        .await;
        self.record_feedback(&original, instruction, "");

        Ok(ModificationOutcome::Queued { workflow_id })
    }

    /// Quality suggestions for the deliverable as it stands
    pub async fn get_suggestions(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
    ) -> Result<Vec<String>> {
        let deliverable = self
            .deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        let ctx = self.context_for(organization_id, &deliverable).await;
        let assessment = self
            .evaluator
            .evaluate(&deliverable.content, &ctx)
            .await
            .map_err(|e| AtelierError::SuggestionsFailed(e.to_string()))?;
        Ok(assessment.suggestions)
    }

    /// The append-only modification trail, ownership-scoped
    pub async fn get_modification_history(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
    ) -> Result<Vec<ModificationRecord>> {
        self.deliverables
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        self.modifications
            .modification_history(deliverable_id)
            .await
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

    /// Store writes that land a finished revision
    async fn land_revision(
        &self,
        organization_id: &str,
        original: &Deliverable,
        revision: &Deliverable,
    ) -> Result<()> {
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
        self.deliverables
            .set_status(organization_id, original.id, DeliverableStatus::Draft)
            .await?;
        Ok(())
    }

    /// Best-effort rollback to draft after a failed transform
    async fn restore_draft(&self, organization_id: &str, deliverable_id: Uuid) {
        fail_open("revision_status_restore", || {
            self.deliverables
                .set_status(organization_id, deliverable_id, DeliverableStatus::Draft)
        })
        .await;
    }

    async fn record_audit(&self, record: ModificationRecord) {
        fail_open("modification_audit", || {
            self.modifications.append_modification(record.clone())
        })
        .await;
    }

    /// Detached feedback-loop write; never blocks or fails the caller
    fn record_feedback(&self, original: &Deliverable, instruction: &str, revised_content: &str) {
        self.recorder.record_detached(InteractionRecord {
            organization_id: original.organization_id.clone(),
            interaction_type: InteractionType::Modification,
            outcome: "revised".to_string(),
            deliverable_id: original.id,
            campaign_id: original.campaign_id,
            original_content: original.content.clone(),
            feedback_content: format!("{}\n---\n{}", instruction, revised_content),
            iteration_count: original.iteration_count + 1,
            created_at: Utc::now(),
        });
    }
}
