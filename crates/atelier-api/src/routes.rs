//! Route handlers
//!
//! Thin translation layer: parse the request, resolve the caller, call the
//! service, map the outcome to a status and body. No business rules live
//! here.

use atelier_core::{
    AtelierError, Channel, ClientRequest, Complexity, Deliverable, DeliverableStatus,
    ModificationMode, ModificationRecord, Project, ProjectStatus, ProjectType, QualitySnapshot,
    Workflow,
};
use atelier_engine::{ExecutionStatus, PhaseReport, WorkflowJob};
use atelier_insight::{RankedVariant, VariantInput};
use atelier_publish::{PublishOptions, PublishOutcome};
use atelier_quality::ProjectContext;
use atelier_revision::ModificationOutcome;
use atelier_store::{DeliverableStore, ProjectStore, WorkflowStore};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::error::ApiResult;
use crate::identity::Caller;
use crate::state::SharedState;

const PREVIEW_CHARS: usize = 160;

fn preview(content: &str) -> String {
    let mut out: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliverablePreview {
    id: Uuid,
    deliverable_type: String,
    status: DeliverableStatus,
    preview: String,
}

impl From<&Deliverable> for DeliverablePreview {
    fn from(d: &Deliverable) -> Self {
        Self {
            id: d.id,
            deliverable_type: d.deliverable_type.to_string(),
            status: d.status,
            preview: preview(&d.content),
        }
    }
}

// ---- Projects ----

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub request: String,
    pub client_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPlanResponse {
    project_id: Uuid,
    plan_id: Uuid,
    project_type: ProjectType,
    complexity: Complexity,
    channels: Vec<Channel>,
    total_phases: usize,
    total_agents: u32,
    total_deliverables: u32,
    quality_gates: Vec<String>,
}

/// POST /projects - plan only, never executes
pub async fn create_project(
    State(state): State<SharedState>,
    caller: Caller,
    Json(body): Json<CreateProjectRequest>,
) -> ApiResult<Json<ProjectPlanResponse>> {
    let client_request = ClientRequest::new(body.request, body.client_id);
    let mut project = Project::new(&caller.organization_id, &client_request);
    let plan = state.planner.build(project.id, &client_request)?;

    let response = ProjectPlanResponse {
        project_id: project.id,
        plan_id: plan.id,
        project_type: plan.analysis.project_type,
        complexity: plan.analysis.complexity,
        channels: plan.analysis.channels.clone(),
        total_phases: plan.phases.len(),
        total_agents: plan.total_agents,
        total_deliverables: plan.total_deliverables,
        quality_gates: plan.quality_gates.clone(),
    };
    project.plan = Some(plan);
    state.store.insert_project(project).await?;
    Ok(Json(response))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    status: ExecutionStatus,
    total_tasks: u32,
    completed_tasks: u32,
    failed_tasks: u32,
    execution_time_ms: u64,
    phases: Vec<PhaseReport>,
    deliverables: Vec<DeliverablePreview>,
}

/// POST /projects/:id/execute
pub async fn execute_project(
    State(state): State<SharedState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ExecuteResponse>> {
    let mut project = state
        .store
        .get_project(&caller.organization_id, project_id)
        .await?;
    let plan = project.plan.clone().ok_or_else(|| {
        AtelierError::InvalidInput(format!("project {} has no plan", project_id))
    })?;

    project.status = ProjectStatus::Executing;
    state.store.update_project(project.clone()).await?;

    let report = match state
        .executor
        .execute(&caller.organization_id, &project.request, &plan)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            // The project must not stay stuck in executing
            error!(project = %project_id, error = %e, "execution aborted");
            project.status = ProjectStatus::Failed;
            state.store.update_project(project).await?;
            return Err(e.into());
        }
    };

    project.status = match report.status {
        ExecutionStatus::Completed => ProjectStatus::Completed,
        ExecutionStatus::Failed => ProjectStatus::Failed,
    };
    state.store.update_project(project).await?;

    Ok(Json(ExecuteResponse {
        status: report.status,
        total_tasks: report.total_tasks,
        completed_tasks: report.completed_tasks,
        failed_tasks: report.failed_tasks,
        execution_time_ms: report.execution_time_ms,
        phases: report.phases,
        deliverables: report.deliverables.iter().map(Into::into).collect(),
    }))
}

// ---- Deliverables ----

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub instruction: String,
}

/// POST /deliverables/:id/modify - always direct
pub async fn modify_deliverable(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
    Json(body): Json<ModifyRequest>,
) -> ApiResult<Json<ModificationOutcome>> {
    let outcome = state
        .modifications
        .modify(
            &caller.organization_id,
            deliverable_id,
            &body.instruction,
            ModificationMode::Direct,
            &caller.actor_id,
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseRequest {
    pub instruction: String,
    /// "direct" or "workflow"; workflow when omitted
    pub mode: Option<String>,
}

/// POST /deliverables/:id/revise - direct or workflow
pub async fn revise_deliverable(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
    Json(body): Json<ReviseRequest>,
) -> ApiResult<Response> {
    let mode = match body.mode.as_deref() {
        None => ModificationMode::Workflow,
        Some(raw) => raw
            .parse::<ModificationMode>()
            .map_err(AtelierError::InvalidInput)?,
    };
    let outcome = state
        .modifications
        .modify(
            &caller.organization_id,
            deliverable_id,
            &body.instruction,
            mode,
            &caller.actor_id,
        )
        .await?;

    let response = match &outcome {
        ModificationOutcome::Queued { workflow_id } => (
            StatusCode::ACCEPTED,
            Json(json!({ "action": "queued", "workflowId": workflow_id })),
        )
            .into_response(),
        ModificationOutcome::Revised { .. } => Json(outcome).into_response(),
    };
    Ok(response)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFixResponse {
    original_id: Uuid,
    new_deliverable_id: Uuid,
    verified: bool,
    preview: String,
    quality: QualitySnapshot,
}

/// POST /deliverables/:id/fix-and-recheck
pub async fn fix_and_recheck(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
) -> ApiResult<Json<AutoFixResponse>> {
    let ctx = project_context(&state, &caller.organization_id, deliverable_id).await?;
    let outcome = state
        .gate
        .auto_fix(&caller.organization_id, deliverable_id, &ctx)
        .await?;
    Ok(Json(AutoFixResponse {
        original_id: outcome.original_id,
        new_deliverable_id: outcome.new_deliverable.id,
        verified: outcome.verified,
        preview: preview(&outcome.new_deliverable.content),
        quality: outcome.snapshot,
    }))
}

/// GET /deliverables/:id/suggestions
pub async fn get_suggestions(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let suggestions = state
        .modifications
        .get_suggestions(&caller.organization_id, deliverable_id)
        .await?;
    Ok(Json(json!({ "suggestions": suggestions })))
}

/// GET /deliverables/:id/history
pub async fn get_history(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ModificationRecord>>> {
    let history = state
        .modifications
        .get_modification_history(&caller.organization_id, deliverable_id)
        .await?;
    Ok(Json(history))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub feedback: Option<String>,
    /// Publish immediately after approval
    #[serde(default)]
    pub auto_publish: bool,
    /// Target for the chained publish; "hosted" when omitted
    pub target: Option<String>,
}

/// POST /deliverables/:id/approve
pub async fn approve_deliverable(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
    Json(body): Json<ApproveRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let target = body
        .auto_publish
        .then(|| body.target.unwrap_or_else(|| "hosted".to_string()));
    let (approved, publish) = state
        .publisher
        .approve(
            &caller.organization_id,
            deliverable_id,
            &caller.actor_id,
            body.feedback,
            target,
        )
        .await?;
    Ok(Json(json!({
        "deliverableId": approved.id,
        "status": approved.status,
        "approval": approved.metadata.approval,
        "publish": publish,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub deliverable_id: Uuid,
    pub target: String,
    /// Scheduled publication time; any value defers to a workflow
    pub when: Option<DateTime<Utc>>,
    /// Extra metadata merged alongside the publish state
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// POST /deliverables/publish
pub async fn publish_deliverable(
    State(state): State<SharedState>,
    caller: Caller,
    Json(body): Json<PublishRequest>,
) -> ApiResult<Response> {
    let outcome = state
        .publisher
        .publish(
            &caller.organization_id,
            body.deliverable_id,
            &body.target,
            PublishOptions {
                when: body.when,
                metadata: body.metadata,
            },
        )
        .await?;
    let response = match &outcome {
        PublishOutcome::Deferred { workflow_id } => (
            StatusCode::ACCEPTED,
            Json(json!({ "action": "deferred", "workflowId": workflow_id })),
        )
            .into_response(),
        PublishOutcome::Published { .. } => Json(outcome).into_response(),
    };
    Ok(response)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantsRequest {
    /// Named aspect pack, expanded server-side
    pub pack: Option<String>,
    #[serde(default)]
    pub aspects: Vec<String>,
}

/// POST /deliverables/:id/variants - always deferred
///
/// Takes a named pack, explicit aspects, or both; the union is generated.
pub async fn generate_variants(
    State(state): State<SharedState>,
    caller: Caller,
    Path(deliverable_id): Path<Uuid>,
    Json(body): Json<VariantsRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let mut aspects: Vec<String> = match body.pack.as_deref() {
        Some(pack) => crate::pipeline::pack_aspects(pack)
            .ok_or_else(|| {
                AtelierError::InvalidInput(format!("unknown aspect pack: {}", pack))
            })?
            .iter()
            .map(|a| a.to_string())
            .collect(),
        None => Vec::new(),
    };
    for aspect in &body.aspects {
        if !aspects.contains(aspect) {
            aspects.push(aspect.clone());
        }
    }
    if aspects.is_empty() {
        return Err(AtelierError::InvalidInput(
            "variant generation requires an aspect pack or at least one aspect".to_string(),
        )
        .into());
    }
    // Ownership check before anything is enqueued
    state
        .store
        .get_deliverable(&caller.organization_id, deliverable_id)
        .await?;

    let org = caller.organization_id.clone();
    let count = aspects.len();
    let workflow_id = state
        .queue
        .enqueue(
            &caller.organization_id,
            format!("Generate {} variants", count),
            |workflow_id| WorkflowJob::VariantGeneration {
                workflow_id,
                organization_id: org,
                deliverable_id,
                aspects,
            },
        )
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "action": "queued", "workflowId": workflow_id })),
    ))
}

// ---- Workflows ----

/// GET /workflows/:id - poll a deferred job
pub async fn get_workflow(
    State(state): State<SharedState>,
    caller: Caller,
    Path(workflow_id): Path<Uuid>,
) -> ApiResult<Json<Workflow>> {
    let workflow = state
        .store
        .get_workflow(&caller.organization_id, workflow_id)
        .await?;
    Ok(Json(workflow))
}

// ---- Predictions ----

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub campaign_goal: String,
}

/// POST /predictions/variants/rank - synchronous
pub async fn rank_variants(
    State(state): State<SharedState>,
    _caller: Caller,
    Json(body): Json<RankRequest>,
) -> ApiResult<Json<Vec<RankedVariant>>> {
    let ranked = state.ranker.rank(&body.variants, &body.campaign_goal)?;
    Ok(Json(ranked))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub channels: Vec<String>,
    pub budget: f64,
}

/// POST /predictions/campaign/:id/forecast
pub async fn forecast_campaign(
    State(state): State<SharedState>,
    caller: Caller,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<ForecastRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let channels = body
        .channels
        .iter()
        .map(|raw| raw.parse::<Channel>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(AtelierError::InvalidInput)?;
    let prediction = state
        .forecaster
        .forecast(&caller.organization_id, campaign_id, &channels, body.budget)
        .await?;
    Ok(Json(serde_json::to_value(prediction).map_err(AtelierError::from)?))
}

// ---- Ambient ----

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "atelier-api",
    }))
}

async fn project_context(
    state: &SharedState,
    organization_id: &str,
    deliverable_id: Uuid,
) -> ApiResult<ProjectContext> {
    let deliverable = state
        .store
        .get_deliverable(organization_id, deliverable_id)
        .await?;
    Ok(
        match state
            .store
            .get_project(organization_id, deliverable.project_id)
            .await
        {
            Ok(project) => ProjectContext::new(project.request),
            Err(_) => ProjectContext::default(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::config::AtelierConfig;
    use atelier_core::DeliverableType;
    use crate::state::AppState;

    async fn seeded_state() -> (SharedState, Uuid) {
        let state = AppState::build(AtelierConfig::default());
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
        state.store.insert_project(project).await.unwrap();
        state.store.insert_deliverable(d.clone()).await.unwrap();
        (state, d.id)
    }

    fn caller() -> Caller {
        Caller {
            organization_id: "org-a".to_string(),
            actor_id: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_variants_accept_a_named_pack() {
        let (state, id) = seeded_state().await;
        let (status, _) = generate_variants(
            State(state),
            caller(),
            Path(id),
            Json(VariantsRequest {
                pack: Some("launch".to_string()),
                aspects: vec![],
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_variants_union_pack_and_explicit_aspects() {
        let (state, id) = seeded_state().await;
        // "urgency" overlaps the pack; the union must not reject or duplicate
        let (status, body) = generate_variants(
            State(state),
            caller(),
            Path(id),
            Json(VariantsRequest {
                pack: Some("launch".to_string()),
                aspects: vec!["urgency".to_string(), "curiosity".to_string()],
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.0["action"], "queued");
    }

    #[tokio::test]
    async fn test_variants_require_pack_or_aspects() {
        let (state, id) = seeded_state().await;
        let err = generate_variants(
            State(state),
            caller(),
            Path(id),
            Json(VariantsRequest {
                pack: None,
                aspects: vec![],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_variants_reject_unknown_pack() {
        let (state, id) = seeded_state().await;
        let err = generate_variants(
            State(state),
            caller(),
            Path(id),
            Json(VariantsRequest {
                pack: Some("retro".to_string()),
                aspects: vec![],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "INVALID_INPUT");
    }
}

