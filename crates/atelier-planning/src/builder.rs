//! Execution plan construction
//!
//! Allocates agents per phase from the registry by category, respecting the
//! declared channel strategy. Deterministic given identical input and
//! registry state.

use atelier_agents::AgentRegistry;
use atelier_core::{
    AgentAssignment, AtelierError, Channel, ClientRequest, Complexity, DeliverableType,
    ExecutionPlan, PlanPhase, Result,
};
use tracing::debug;
use uuid::Uuid;

use crate::classifier::RequestClassifier;

/// Builds execution plans from client requests
pub struct PlanBuilder {
    registry: AgentRegistry,
}

impl PlanBuilder {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }

    /// Build a plan for a project
    ///
    /// Rejects empty request text before any construction.
    pub fn build(&self, project_id: Uuid, request: &ClientRequest) -> Result<ExecutionPlan> {
        if request.request.trim().is_empty() {
            return Err(AtelierError::InvalidInput(
                "request text must not be empty".to_string(),
            ));
        }

        let analysis = RequestClassifier::classify(&request.request);
        debug!(
            project_type = %analysis.project_type,
            complexity = %analysis.complexity,
            scope = analysis.expanded_scope.len(),
            "classified request"
        );

        let mut plan = ExecutionPlan::new(project_id, analysis);

        // Gates are declared per text deliverable type in scope; binary types
        // bypass the text quality gate.
        plan.quality_gates = plan
            .analysis
            .expanded_scope
            .iter()
            .filter(|t| !t.is_binary())
            .map(|t| format!("gate:{}", t))
            .collect();

        let strategy = self.strategy_phase(&plan)?;
        plan.push_phase(strategy);

        let creation = self.creation_phase(&plan)?;
        if !creation.assignments.is_empty() {
            plan.push_phase(creation);
        }

        if let Some(distribution) = self.distribution_phase(&plan) {
            plan.push_phase(distribution);
        }

        if plan.analysis.complexity >= Complexity::Complex {
            if let Some(review) = self.review_phase() {
                plan.push_phase(review);
            }
        }

        Ok(plan)
    }

    fn assignment_for(&self, deliverable_type: DeliverableType, expected: u32) -> Result<AgentAssignment> {
        let agent = self.registry.for_type(deliverable_type).ok_or_else(|| {
            AtelierError::Internal(format!(
                "no registered agent produces {}",
                deliverable_type
            ))
        })?;
        Ok(AgentAssignment {
            agent_id: agent.id.clone(),
            role: agent.role.clone(),
            deliverable_type,
            expected_deliverables: expected,
        })
    }

    /// Expected count for a type, scaled up for enterprise scope
    /// (a global launch implies localized variants of audience-facing copy)
    fn expected_count(&self, plan: &ExecutionPlan, deliverable_type: DeliverableType) -> u32 {
        let base = match deliverable_type {
            DeliverableType::SocialMedia => 3,
            _ => 1,
        };
        let localized = matches!(
            deliverable_type,
            DeliverableType::SocialMedia | DeliverableType::AdCopy | DeliverableType::EmailSequence
        );
        if plan.analysis.complexity == Complexity::Enterprise && localized {
            base * 2
        } else {
            base
        }
    }

    fn strategy_phase(&self, plan: &ExecutionPlan) -> Result<PlanPhase> {
        let mut phase = PlanPhase::new("strategy", "Classify the ask and produce the strategic foundation");
        for t in [DeliverableType::StrategicBrief, DeliverableType::Deck] {
            if plan.analysis.expanded_scope.contains(&t) {
                phase = phase.with_assignment(self.assignment_for(t, 1)?);
            }
        }
        Ok(phase)
    }

    fn creation_phase(&self, plan: &ExecutionPlan) -> Result<PlanPhase> {
        let mut phase = PlanPhase::new("creation", "Produce the creative and content deliverables");
        for t in &plan.analysis.expanded_scope {
            if matches!(t, DeliverableType::StrategicBrief | DeliverableType::Deck) {
                continue;
            }
            let expected = self.expected_count(plan, *t);
            phase = phase.with_assignment(self.assignment_for(*t, expected)?);
        }
        Ok(phase)
    }

    /// One paid-media assignment per paid channel; skipped for organic-only plans
    fn distribution_phase(&self, plan: &ExecutionPlan) -> Option<PlanPhase> {
        let paid: Vec<Channel> = plan
            .analysis
            .channels
            .iter()
            .copied()
            .filter(|c| !matches!(c, Channel::Organic | Channel::Email))
            .collect();
        if paid.is_empty() {
            return None;
        }

        let specialist = self.registry.get("paid-media-specialist")?;
        let mut phase = PlanPhase::new(
            "distribution",
            "Adapt approved copy per paid channel and prepare placements",
        );
        for channel in paid {
            phase = phase.with_assignment(AgentAssignment {
                agent_id: specialist.id.clone(),
                role: format!("{} ({})", specialist.role, channel),
                deliverable_type: DeliverableType::AdCopy,
                expected_deliverables: 1,
            });
        }
        Some(phase)
    }

    fn review_phase(&self) -> Option<PlanPhase> {
        let analyst = self.registry.get("performance-analyst")?;
        Some(
            PlanPhase::new("review", "Compile the wrap-up performance deck").with_assignment(
                AgentAssignment {
                    agent_id: analyst.id.clone(),
                    role: analyst.role.clone(),
                    deliverable_type: DeliverableType::Deck,
                    expected_deliverables: 1,
                },
            ),
        )
    }
}
