//! Plan execution
//!
//! Contract: phases run strictly in declared order; assignments within a
//! phase run concurrently with no ordering guarantee. A failed assignment is
//! recorded and execution continues; the run as a whole fails only when the
//! failures make a declared quality gate unattainable. Re-execution is
//! idempotent: deliverables already produced for an assignment slot are
//! reused, never duplicated.

use atelier_agents::{AgentBrief, AgentInvoker};
use atelier_core::{Deliverable, ExecutionPlan, PlanPhase, Result};
use atelier_store::DeliverableStore;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
}

/// Per-phase result summary
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub name: String,
    pub produced: u32,
    pub reused: u32,
    pub failed: u32,
}

/// Result of one engine invocation
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub phases: Vec<PhaseReport>,
    pub deliverables: Vec<Deliverable>,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    pub execution_time_ms: u64,
}

enum SlotOutcome {
    Reused(Deliverable),
    Produced(Deliverable),
    Failed,
}

/// The execution engine
pub struct Executor {
    store: Arc<dyn DeliverableStore>,
    invoker: Arc<dyn AgentInvoker>,
    /// Concurrency cap for in-flight assignments within a phase
    limiter: Arc<Semaphore>,
}

impl Executor {
    pub fn new(
        store: Arc<dyn DeliverableStore>,
        invoker: Arc<dyn AgentInvoker>,
        max_concurrent_assignments: usize,
    ) -> Self {
        Self {
            store,
            invoker,
            limiter: Arc::new(Semaphore::new(max_concurrent_assignments.max(1))),
        }
    }

    /// Execute a plan for its project
    ///
    /// `request_text` is the originating client request, passed through to
    /// agents as their brief.
    pub async fn execute(
        &self,
        organization_id: &str,
        request_text: &str,
        plan: &ExecutionPlan,
    ) -> Result<ExecutionReport> {
        let started = Instant::now();
        info!(plan = %plan.id, phases = plan.phases.len(), "starting plan execution");

        let brief = AgentBrief {
            project_request: request_text.to_string(),
            project_type: plan.analysis.project_type,
            channels: plan.analysis.channels.clone(),
        };

        let mut phases = Vec::with_capacity(plan.phases.len());
        let mut deliverables = Vec::new();
        let mut completed_tasks = 0u32;
        let mut failed_tasks = 0u32;
        let total_tasks: u32 = plan
            .phases
            .iter()
            .flat_map(|p| &p.assignments)
            .map(|a| a.expected_deliverables)
            .sum();

        for phase in &plan.phases {
            let report = self
                .run_phase(organization_id, plan, phase, &brief, &mut deliverables)
                .await;
            completed_tasks += report.produced + report.reused;
            failed_tasks += report.failed;
            phases.push(report);
        }

        let status = if self.gates_attainable(plan, &deliverables) {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };

        let execution_time_ms = started.elapsed().as_millis() as u64;
        info!(
            plan = %plan.id,
            ?status,
            completed_tasks,
            failed_tasks,
            execution_time_ms,
            "plan execution finished"
        );

        Ok(ExecutionReport {
            status,
            phases,
            deliverables,
            total_tasks,
            completed_tasks,
            failed_tasks,
            execution_time_ms,
        })
    }

    /// Run one phase: every assignment slot dispatched concurrently,
    /// collected when the slowest finishes
    async fn run_phase(
        &self,
        organization_id: &str,
        plan: &ExecutionPlan,
        phase: &PlanPhase,
        brief: &AgentBrief,
        deliverables: &mut Vec<Deliverable>,
    ) -> PhaseReport {
        let mut slots = Vec::new();
        for (index, assignment) in phase.assignments.iter().enumerate() {
            for slot in 0..assignment.expected_deliverables {
                // The assignment index keeps keys distinct when one agent
                // holds several assignments in the same phase
                let key = format!(
                    "{}/{}/{}/{}/{}/{}",
                    plan.id, phase.name, index, assignment.agent_id, assignment.deliverable_type, slot
                );
                slots.push(self.run_slot(organization_id, plan, assignment.clone(), key, brief));
            }
        }

        let outcomes = join_all(slots).await;

        let mut report = PhaseReport {
            name: phase.name.clone(),
            produced: 0,
            reused: 0,
            failed: 0,
        };
        for outcome in outcomes {
            match outcome {
                SlotOutcome::Produced(d) => {
                    report.produced += 1;
                    deliverables.push(d);
                }
                SlotOutcome::Reused(d) => {
                    report.reused += 1;
                    deliverables.push(d);
                }
                SlotOutcome::Failed => report.failed += 1,
            }
        }

        info!(
            phase = %phase.name,
            produced = report.produced,
            reused = report.reused,
            failed = report.failed,
            "phase complete"
        );
        report
    }

    async fn run_slot(
        &self,
        organization_id: &str,
        plan: &ExecutionPlan,
        assignment: atelier_core::AgentAssignment,
        assignment_key: String,
        brief: &AgentBrief,
    ) -> SlotOutcome {
        // Idempotency: a slot that already produced a deliverable is reused
        match self
            .store
            .find_by_assignment_key(organization_id, plan.project_id, &assignment_key)
            .await
        {
            Ok(Some(existing)) => return SlotOutcome::Reused(existing),
            Ok(None) => {}
            Err(e) => {
                warn!(key = %assignment_key, error = %e, "assignment lookup failed");
                return SlotOutcome::Failed;
            }
        }

        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return SlotOutcome::Failed,
        };

        match self.invoker.invoke(&assignment, brief).await {
            Ok(output) => {
                let deliverable = Deliverable::new(
                    plan.project_id,
                    organization_id,
                    assignment_key,
                    assignment.deliverable_type,
                    output.content,
                );
                match self.store.insert_deliverable(deliverable.clone()).await {
                    Ok(()) => SlotOutcome::Produced(deliverable),
                    Err(e) => {
                        warn!(key = %deliverable.assignment_key, error = %e, "deliverable insert failed");
                        SlotOutcome::Failed
                    }
                }
            }
            // No single agent failure aborts the run
            Err(e) => {
                warn!(
                    agent = %assignment.agent_id,
                    deliverable_type = %assignment.deliverable_type,
                    error = %e,
                    "agent invocation failed"
                );
                SlotOutcome::Failed
            }
        }
    }

    /// A gate is attainable iff at least one deliverable of its type exists
    fn gates_attainable(&self, plan: &ExecutionPlan, deliverables: &[Deliverable]) -> bool {
        plan.quality_gates.iter().all(|gate| {
            match ExecutionPlan::gate_type(gate) {
                Some(required) => deliverables.iter().any(|d| d.deliverable_type == required),
                // Unparseable gates cannot block completion
                None => true,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atelier_agents::{AgentOutput, AgentRegistry, TemplateInvoker};
    use atelier_core::{AgentAssignment, AtelierError, ClientRequest, DeliverableType};
    use atelier_planning::PlanBuilder;
    use atelier_store::MemStore;
    use uuid::Uuid;

    const REQUEST: &str = "Launch our new analytics product on Meta with an email nurture";

    fn plan() -> ExecutionPlan {
        let builder = PlanBuilder::new(AgentRegistry::standard());
        builder
            .build(Uuid::new_v4(), &ClientRequest::new(REQUEST, "client-1"))
            .unwrap()
    }

    /// Invoker that fails for one deliverable type and delegates otherwise
    struct FailFor {
        failing: DeliverableType,
        inner: TemplateInvoker,
    }

    #[async_trait]
    impl AgentInvoker for FailFor {
        async fn invoke(
            &self,
            assignment: &AgentAssignment,
            brief: &AgentBrief,
        ) -> Result<AgentOutput> {
            if assignment.deliverable_type == self.failing {
                return Err(AtelierError::Internal("agent crashed".to_string()));
            }
            self.inner.invoke(assignment, brief).await
        }
    }

    #[tokio::test]
    async fn test_successful_run_produces_all_tasks() {
        let store = Arc::new(MemStore::new());
        let executor = Executor::new(store.clone(), Arc::new(TemplateInvoker::new()), 4);
        let plan = plan();

        let report = executor.execute("org-a", REQUEST, &plan).await.unwrap();

        assert_eq!(report.status, ExecutionStatus::Completed);
        assert_eq!(report.failed_tasks, 0);
        assert_eq!(report.completed_tasks, report.total_tasks);
        assert_eq!(report.deliverables.len() as u32, report.total_tasks);
        // Phases reported in declared order
        assert_eq!(report.phases[0].name, "strategy");
    }

    #[tokio::test]
    async fn test_reexecution_is_idempotent() {
        let store = Arc::new(MemStore::new());
        let executor = Executor::new(store.clone(), Arc::new(TemplateInvoker::new()), 4);
        let plan = plan();

        let first = executor.execute("org-a", REQUEST, &plan).await.unwrap();
        let second = executor.execute("org-a", REQUEST, &plan).await.unwrap();

        // Zero additional deliverables on re-run
        let produced: u32 = second.phases.iter().map(|p| p.produced).sum();
        assert_eq!(produced, 0);
        let reused: u32 = second.phases.iter().map(|p| p.reused).sum();
        assert_eq!(reused, first.total_tasks);

        let rows = store
            .list_for_project("org-a", plan.project_id)
            .await
            .unwrap();
        assert_eq!(rows.len() as u32, first.total_tasks);
    }

    #[tokio::test]
    async fn test_partial_failure_continues_and_fails_gate() {
        let store = Arc::new(MemStore::new());
        // Email agent fails; gate:email-sequence becomes unattainable
        let executor = Executor::new(
            store.clone(),
            Arc::new(FailFor {
                failing: DeliverableType::EmailSequence,
                inner: TemplateInvoker::new(),
            }),
            4,
        );
        let plan = plan();
        assert!(plan.quality_gates.iter().any(|g| g == "gate:email-sequence"));

        let report = executor.execute("org-a", REQUEST, &plan).await.unwrap();

        assert_eq!(report.status, ExecutionStatus::Failed);
        assert!(report.failed_tasks > 0);
        // Other assignments still produced deliverables
        assert!(report.completed_tasks > 0);
    }

    #[tokio::test]
    async fn test_gated_failure_recovers_on_healthy_rerun() {
        let store = Arc::new(MemStore::new());
        // The brief is gated for a launch, so its failure fails the run
        let executor = Executor::new(
            store.clone(),
            Arc::new(FailFor {
                failing: DeliverableType::StrategicBrief,
                inner: TemplateInvoker::new(),
            }),
            4,
        );
        let plan = plan();
        assert!(plan.quality_gates.iter().any(|g| g == "gate:strategic-brief"));

        let report = executor.execute("org-a", REQUEST, &plan).await.unwrap();
        assert_eq!(report.status, ExecutionStatus::Failed);

        // A re-run with a healthy invoker backfills only the missing slots
        // and completes
        let executor = Executor::new(store.clone(), Arc::new(TemplateInvoker::new()), 4);
        let report = executor.execute("org-a", REQUEST, &plan).await.unwrap();
        assert_eq!(report.status, ExecutionStatus::Completed);
        assert_eq!(report.failed_tasks, 0);
    }

    #[tokio::test]
    async fn test_binary_failure_without_gate_impact_completes() {
        let store = Arc::new(MemStore::new());
        let builder = PlanBuilder::new(AgentRegistry::standard());
        let request = "Brand awareness campaign with video";
        let plan = builder
            .build(Uuid::new_v4(), &ClientRequest::new(request, "client-1"))
            .unwrap();
        // Images are binary and never gated
        assert!(!plan.quality_gates.iter().any(|g| g == "gate:image"));

        let executor = Executor::new(
            store.clone(),
            Arc::new(FailFor {
                failing: DeliverableType::Image,
                inner: TemplateInvoker::new(),
            }),
            4,
        );
        let report = executor.execute("org-a", request, &plan).await.unwrap();

        assert_eq!(report.status, ExecutionStatus::Completed);
        assert!(report.failed_tasks > 0);
    }

    #[tokio::test]
    async fn test_shared_agent_assignments_keep_distinct_slots() {
        let store = Arc::new(MemStore::new());
        let executor = Executor::new(store.clone(), Arc::new(TemplateInvoker::new()), 4);
        // The copywriter holds two creation assignments (ad copy and landing
        // page) and the paid specialist one per paid channel
        let builder = PlanBuilder::new(AgentRegistry::standard());
        let request = "Launch our new analytics product on Meta and Google with an email nurture";
        let plan = builder
            .build(Uuid::new_v4(), &ClientRequest::new(request, "client-1"))
            .unwrap();

        let report = executor.execute("org-a", request, &plan).await.unwrap();

        assert_eq!(report.status, ExecutionStatus::Completed);
        assert_eq!(report.deliverables.len() as u32, report.total_tasks);
        let keys: std::collections::HashSet<&str> = report
            .deliverables
            .iter()
            .map(|d| d.assignment_key.as_str())
            .collect();
        assert_eq!(keys.len(), report.deliverables.len());
        assert!(report
            .deliverables
            .iter()
            .any(|d| d.deliverable_type == DeliverableType::AdCopy));
        assert!(report
            .deliverables
            .iter()
            .any(|d| d.deliverable_type == DeliverableType::LandingPage));
    }
}
