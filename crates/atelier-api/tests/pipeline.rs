//! End-to-end pipeline flow through the wired application state

use async_trait::async_trait;
use atelier_agents::TemplateInvoker;
use atelier_api::AppState;
use atelier_core::config::AtelierConfig;
use atelier_core::{
    AtelierError, Channel, ClientRequest, Deliverable, DeliverableStatus, DeliverableType,
    ModificationMode, Project, Result, WorkflowStatus,
};
use atelier_publish::{DirectIntegration, PublishOptions, PublishOutcome};
use atelier_quality::HeuristicEvaluator;
use atelier_revision::ModificationOutcome;
use atelier_store::{DeliverableStore, MemStore, ProjectStore, WorkflowStore};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct DownIntegration;

#[async_trait]
impl DirectIntegration for DownIntegration {
    fn target(&self) -> &str {
        "webflow"
    }

    async fn publish(&self, _deliverable: &Deliverable) -> Result<String> {
        Err(AtelierError::Integration("upstream 503".to_string()))
    }
}

fn app(store: Arc<MemStore>) -> atelier_api::SharedState {
    AppState::build_with(
        AtelierConfig::default(),
        store,
        Arc::new(TemplateInvoker::new()),
        Arc::new(HeuristicEvaluator::default()),
        Some(Arc::new(DownIntegration)),
    )
}

async fn wait_terminal(store: &MemStore, org: &str, id: Uuid) -> WorkflowStatus {
    for _ in 0..100 {
        let wf = store.get_workflow(org, id).await.unwrap();
        if matches!(wf.status, WorkflowStatus::Completed | WorkflowStatus::Failed) {
            return wf.status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("workflow never reached a terminal status");
}

#[tokio::test]
async fn test_request_to_published_deliverable() {
    let store = Arc::new(MemStore::new());
    let state = app(store.clone());
    let org = "org-a";

    // Plan
    let request = ClientRequest::new(
        "Launch our new analytics product on Meta with an email nurture",
        "client-1",
    );
    let mut project = Project::new(org, &request);
    let plan = state.planner.build(project.id, &request).unwrap();
    project.plan = Some(plan.clone());
    store.insert_project(project.clone()).await.unwrap();

    // Execute
    let report = state
        .executor
        .execute(org, &project.request, &plan)
        .await
        .unwrap();
    assert_eq!(report.failed_tasks, 0);
    assert!(!report.deliverables.is_empty());

    // Pick a text deliverable and push it through approve + publish; the
    // direct integration is down, so webflow must degrade to a workflow
    let deliverable = report
        .deliverables
        .iter()
        .find(|d| d.deliverable_type == DeliverableType::AdCopy)
        .expect("plan produced ad copy");
    state
        .publisher
        .approve(org, deliverable.id, "reviewer-1", None, None)
        .await
        .unwrap();
    let outcome = state
        .publisher
        .publish(org, deliverable.id, "webflow", PublishOptions::default())
        .await
        .unwrap();
    let workflow_id = match outcome {
        PublishOutcome::Deferred { workflow_id } => workflow_id,
        other => panic!("expected fallback to deferred publish, got {:?}", other),
    };

    // The deferred publish worker eventually lands it
    assert_eq!(
        wait_terminal(&store, org, workflow_id).await,
        WorkflowStatus::Completed
    );
    let published = store.get_deliverable(org, deliverable.id).await.unwrap();
    assert_eq!(published.status, DeliverableStatus::Published);
}

#[tokio::test]
async fn test_workflow_revision_round_trip() {
    let store = Arc::new(MemStore::new());
    let state = app(store.clone());
    let org = "org-a";

    let request = ClientRequest::new("Launch the analytics product", "client-1");
    let mut project = Project::new(org, &request);
    let plan = state.planner.build(project.id, &request).unwrap();
    project.plan = Some(plan.clone());
    store.insert_project(project.clone()).await.unwrap();
    let report = state
        .executor
        .execute(org, &project.request, &plan)
        .await
        .unwrap();
    let deliverable = &report.deliverables[0];

    let outcome = state
        .modifications
        .modify(
            org,
            deliverable.id,
            "Focus on mid-market buyers",
            ModificationMode::Workflow,
            "reviewer-1",
        )
        .await
        .unwrap();
    let workflow_id = match outcome {
        ModificationOutcome::Queued { workflow_id } => workflow_id,
        other => panic!("expected queued revision, got {:?}", other),
    };

    assert_eq!(
        wait_terminal(&store, org, workflow_id).await,
        WorkflowStatus::Completed
    );
    // The worker linked a new revision onto the original
    let original = store.get_deliverable(org, deliverable.id).await.unwrap();
    let revision_id = original
        .metadata
        .last_revision_id()
        .expect("revision linked");
    let revision = store.get_deliverable(org, revision_id).await.unwrap();
    assert_eq!(revision.iteration_count, deliverable.iteration_count + 1);
}

#[tokio::test]
async fn test_forecast_for_unknown_campaign_is_not_found() {
    let store = Arc::new(MemStore::new());
    let state = app(store);

    let err = state
        .forecaster
        .forecast("org-a", Uuid::new_v4(), &[Channel::Meta], 5_000.0)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_FOUND");
}
