//! Deferred workflow queue
//!
//! Workflow-mode operations return immediately with a queued workflow id;
//! a single background worker drains the queue and records terminal status
//! on each job's store row. The queue holds job payloads; the store row is
//! the caller-visible view.

use async_trait::async_trait;
use atelier_core::{AtelierError, Result, Workflow, WorkflowKind, WorkflowStatus};
use atelier_store::WorkflowStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

const QUEUE_DEPTH: usize = 256;

/// A unit of deferred work
#[derive(Debug, Clone)]
pub enum WorkflowJob {
    Revision {
        workflow_id: Uuid,
        organization_id: String,
        deliverable_id: Uuid,
        goal: String,
    },
    Publish {
        workflow_id: Uuid,
        organization_id: String,
        deliverable_id: Uuid,
        target: String,
    },
    VariantGeneration {
        workflow_id: Uuid,
        organization_id: String,
        deliverable_id: Uuid,
        aspects: Vec<String>,
    },
}

impl WorkflowJob {
    pub fn workflow_id(&self) -> Uuid {
        match self {
            Self::Revision { workflow_id, .. }
            | Self::Publish { workflow_id, .. }
            | Self::VariantGeneration { workflow_id, .. } => *workflow_id,
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        match self {
            Self::Revision { .. } => WorkflowKind::Revision,
            Self::Publish { .. } => WorkflowKind::Publish,
            Self::VariantGeneration { .. } => WorkflowKind::VariantGeneration,
        }
    }
}

/// Executes one dequeued job; implemented at the composition root where the
/// revision, publish, and variant services are all in scope
#[async_trait]
pub trait WorkflowHandler: Send + Sync {
    async fn handle(&self, job: WorkflowJob) -> Result<serde_json::Value>;
}

/// Handle for enqueueing deferred jobs
#[derive(Clone)]
pub struct WorkflowQueue {
    store: Arc<dyn WorkflowStore>,
    sender: mpsc::Sender<WorkflowJob>,
}

impl WorkflowQueue {
    /// Spawn the worker loop and return the enqueue handle
    pub fn start(store: Arc<dyn WorkflowStore>, handler: Arc<dyn WorkflowHandler>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<WorkflowJob>(QUEUE_DEPTH);

        let worker_store = store.clone();
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let id = job.workflow_id();
                if let Err(e) = worker_store
                    .update_workflow_status(id, WorkflowStatus::Running, None, None)
                    .await
                {
                    warn!(workflow = %id, error = %e, "failed to mark workflow running");
                }

                let kind = job.kind();
                match handler.handle(job).await {
                    Ok(result) => {
                        info!(workflow = %id, ?kind, "workflow completed");
                        if let Err(e) = worker_store
                            .update_workflow_status(
                                id,
                                WorkflowStatus::Completed,
                                None,
                                Some(result),
                            )
                            .await
                        {
                            error!(workflow = %id, error = %e, "failed to record completion");
                        }
                    }
                    Err(e) => {
                        warn!(workflow = %id, ?kind, error = %e, "workflow failed");
                        if let Err(e) = worker_store
                            .update_workflow_status(
                                id,
                                WorkflowStatus::Failed,
                                Some(e.to_string()),
                                None,
                            )
                            .await
                        {
                            error!(workflow = %id, error = %e, "failed to record failure");
                        }
                    }
                }
            }
        });

        Self { store, sender }
    }

    /// Insert the workflow row, then hand the job to the worker
    ///
    /// The row exists before the caller gets the id back, so a poll that
    /// races the worker sees `queued` rather than a missing workflow.
    pub async fn enqueue(
        &self,
        organization_id: &str,
        detail: impl Into<String>,
        build: impl FnOnce(Uuid) -> WorkflowJob,
    ) -> Result<Uuid> {
        let job = build(Uuid::new_v4());
        let workflow_id = job.workflow_id();

        let workflow = Workflow {
            id: workflow_id,
            ..Workflow::new(organization_id, job.kind()).with_detail(detail)
        };
        self.store.insert_workflow(workflow).await?;

        self.sender
            .send(job)
            .await
            .map_err(|_| AtelierError::Internal("workflow queue is shut down".to_string()))?;

        info!(workflow = %workflow_id, "workflow queued");
        Ok(workflow_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_store::MemStore;
    use serde_json::json;
    use std::time::Duration;

    struct Scripted;

    #[async_trait]
    impl WorkflowHandler for Scripted {
        async fn handle(&self, job: WorkflowJob) -> Result<serde_json::Value> {
            match job {
                WorkflowJob::Revision { goal, .. } if goal.contains("explode") => {
                    Err(AtelierError::RevisionFailed("agent unavailable".to_string()))
                }
                WorkflowJob::Revision { deliverable_id, .. } => {
                    Ok(json!({ "revised": deliverable_id }))
                }
                WorkflowJob::Publish { target, .. } => Ok(json!({ "target": target })),
                WorkflowJob::VariantGeneration { aspects, .. } => {
                    Ok(json!({ "variants": aspects.len() }))
                }
            }
        }
    }

    async fn wait_for_terminal(store: &MemStore, org: &str, id: Uuid) -> Workflow {
        for _ in 0..50 {
            let wf = store.get_workflow(org, id).await.unwrap();
            if matches!(wf.status, WorkflowStatus::Completed | WorkflowStatus::Failed) {
                return wf;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("workflow never reached a terminal status");
    }

    #[tokio::test]
    async fn test_job_completes_with_result() {
        let store = Arc::new(MemStore::new());
        let queue = WorkflowQueue::start(store.clone(), Arc::new(Scripted));

        let deliverable_id = Uuid::new_v4();
        let id = queue
            .enqueue("org-a", "tighten the headline", |workflow_id| {
                WorkflowJob::Revision {
                    workflow_id,
                    organization_id: "org-a".to_string(),
                    deliverable_id,
                    goal: "tighten the headline".to_string(),
                }
            })
            .await
            .unwrap();

        let wf = wait_for_terminal(&store, "org-a", id).await;
        assert_eq!(wf.status, WorkflowStatus::Completed);
        assert_eq!(wf.result, Some(json!({ "revised": deliverable_id })));
    }

    #[tokio::test]
    async fn test_failed_job_records_detail() {
        let store = Arc::new(MemStore::new());
        let queue = WorkflowQueue::start(store.clone(), Arc::new(Scripted));

        let id = queue
            .enqueue("org-a", "explode", |workflow_id| WorkflowJob::Revision {
                workflow_id,
                organization_id: "org-a".to_string(),
                deliverable_id: Uuid::new_v4(),
                goal: "explode please".to_string(),
            })
            .await
            .unwrap();

        let wf = wait_for_terminal(&store, "org-a", id).await;
        assert_eq!(wf.status, WorkflowStatus::Failed);
        assert!(wf.detail.unwrap().contains("agent unavailable"));
        assert!(wf.result.is_none());
    }

    #[tokio::test]
    async fn test_row_visible_before_worker_finishes() {
        let store = Arc::new(MemStore::new());
        let queue = WorkflowQueue::start(store.clone(), Arc::new(Scripted));

        let id = queue
            .enqueue("org-a", "publish to webflow", |workflow_id| {
                WorkflowJob::Publish {
                    workflow_id,
                    organization_id: "org-a".to_string(),
                    deliverable_id: Uuid::new_v4(),
                    target: "webflow".to_string(),
                }
            })
            .await
            .unwrap();

        // Visible immediately, whatever state the worker has reached
        let wf = store.get_workflow("org-a", id).await.unwrap();
        assert_eq!(wf.kind, WorkflowKind::Publish);
        assert_eq!(wf.detail.as_deref(), Some("publish to webflow"));
    }

    #[tokio::test]
    async fn test_cross_tenant_poll_is_not_found() {
        let store = Arc::new(MemStore::new());
        let queue = WorkflowQueue::start(store.clone(), Arc::new(Scripted));

        let id = queue
            .enqueue("org-a", "variants", |workflow_id| {
                WorkflowJob::VariantGeneration {
                    workflow_id,
                    organization_id: "org-a".to_string(),
                    deliverable_id: Uuid::new_v4(),
                    aspects: vec!["urgency".to_string()],
                }
            })
            .await
            .unwrap();

        let err = store.get_workflow("org-b", id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
