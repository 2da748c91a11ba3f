//! Application state and wiring

use atelier_agents::{AgentInvoker, AgentRegistry, TemplateInvoker};
use atelier_core::config::AtelierConfig;
use atelier_engine::{Executor, WorkflowQueue};
use atelier_insight::{FeedbackRecorder, Forecaster, VariantRanker};
use atelier_planning::PlanBuilder;
use atelier_publish::{DirectIntegration, PublishController};
use atelier_quality::{Evaluator, HeuristicEvaluator, QualityGate};
use atelier_revision::ModificationService;
use atelier_store::MemStore;
use std::sync::Arc;

use crate::pipeline::PipelineHandler;

/// Everything the route handlers need
pub struct AppState {
    pub store: Arc<MemStore>,
    pub planner: PlanBuilder,
    pub executor: Executor,
    pub gate: QualityGate,
    pub modifications: ModificationService,
    pub publisher: PublishController,
    pub forecaster: Forecaster,
    pub ranker: VariantRanker,
    pub queue: WorkflowQueue,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the full pipeline with the in-memory store and deterministic
    /// evaluator/invoker implementations
    pub fn build(config: AtelierConfig) -> SharedState {
        let invoker: Arc<dyn AgentInvoker> = Arc::new(TemplateInvoker::new());
        let evaluator: Arc<dyn Evaluator> =
            Arc::new(HeuristicEvaluator::new(config.quality.pass_threshold));
        Self::build_with(config, Arc::new(MemStore::new()), invoker, evaluator, None)
    }

    /// Wiring seam for tests and alternative integrations
    pub fn build_with(
        config: AtelierConfig,
        store: Arc<MemStore>,
        invoker: Arc<dyn AgentInvoker>,
        evaluator: Arc<dyn Evaluator>,
        publish_integration: Option<Arc<dyn DirectIntegration>>,
    ) -> SharedState {
        let handler = PipelineHandler::new(
            store.clone(),
            store.clone(),
            evaluator.clone(),
            VariantRanker::default(),
            config.publish.clone(),
        );
        let queue = WorkflowQueue::start(store.clone(), Arc::new(handler));
        let recorder = FeedbackRecorder::new(store.clone());

        let mut publisher = PublishController::new(
            store.clone(),
            recorder.clone(),
            queue.clone(),
            config.publish.clone(),
        );
        if let Some(integration) = publish_integration {
            publisher = publisher.with_integration(integration);
        }

        Arc::new(AppState {
            planner: PlanBuilder::new(AgentRegistry::standard()),
            executor: Executor::new(
                store.clone(),
                invoker,
                config.engine.max_concurrent_assignments,
            ),
            gate: QualityGate::new(evaluator.clone(), store.clone(), config.quality.clone()),
            modifications: ModificationService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                recorder,
                evaluator,
                queue.clone(),
                config.revision.clone(),
            ),
            publisher,
            forecaster: Forecaster::new(store.clone(), store.clone()),
            ranker: VariantRanker::default(),
            queue,
            store,
        })
    }
}
