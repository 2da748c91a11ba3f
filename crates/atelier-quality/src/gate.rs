//! The combined quality gate and the auto-fix flow

use atelier_core::config::QualityConfig;
use atelier_core::{
    AtelierError, Deliverable, DeliverableType, MetadataPatch, QualityAssessment,
    QualitySnapshot, Result, RevisionLineage, ValidatorResult,
};
use atelier_store::DeliverableStore;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::evaluator::{Evaluator, ProjectContext};
use crate::validators::HardValidators;

/// File extensions that mark content as a binary asset reference
const BINARY_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".mp4", ".mov"];

/// Outcome of one fix-and-recheck pass
#[derive(Debug, Clone)]
pub struct AutoFixOutcome {
    pub original_id: Uuid,
    pub new_deliverable: Deliverable,
    pub snapshot: QualitySnapshot,
    pub verified: bool,
}

/// Quality gate: soft evaluation + hard validators + auto-fix
pub struct QualityGate {
    evaluator: Arc<dyn Evaluator>,
    validators: HardValidators,
    store: Arc<dyn DeliverableStore>,
    config: QualityConfig,
}

impl QualityGate {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        store: Arc<dyn DeliverableStore>,
        config: QualityConfig,
    ) -> Self {
        Self {
            evaluator,
            validators: HardValidators::new(),
            store,
            config,
        }
    }

    /// Soft evaluation pass
    pub async fn evaluate_deliverable(
        &self,
        content: &str,
        ctx: &ProjectContext,
    ) -> Result<QualityAssessment> {
        self.evaluator.evaluate(content, ctx).await
    }

    /// Hard validator pass; independent of the soft score
    pub fn run_hard_validators(
        &self,
        content: &str,
        deliverable_type: DeliverableType,
    ) -> Vec<ValidatorResult> {
        self.validators.run(content, deliverable_type)
    }

    /// Combined verdict snapshot for content as-is
    pub async fn assess(
        &self,
        content: &str,
        deliverable_type: DeliverableType,
        ctx: &ProjectContext,
    ) -> Result<QualitySnapshot> {
        let assessment = self.evaluate_deliverable(content, ctx).await?;
        let validators = self.run_hard_validators(content, deliverable_type);
        Ok(QualitySnapshot::new(assessment, validators))
    }

    fn reject_binary(deliverable: &Deliverable) -> Result<()> {
        let content = deliverable.content.trim().to_lowercase();
        let binary_content = content.starts_with("asset://")
            || BINARY_EXTENSIONS.iter().any(|ext| content.ends_with(ext));
        if deliverable.deliverable_type.is_binary() || binary_content {
            return Err(AtelierError::Unsupported(format!(
                "auto-fix does not support binary deliverables ({})",
                deliverable.deliverable_type
            )));
        }
        Ok(())
    }

    /// Auto-fix flow: evaluate, improve, save as a linked revision, re-check
    ///
    /// The improve/re-evaluate cycle is bounded by
    /// `QualityConfig::max_improve_passes` (default 1) and stops early once
    /// the revision verifies. The re-check always runs the full validator
    /// set, so a failing rule is carried into the outcome rather than
    /// dropped.
    pub async fn auto_fix(
        &self,
        organization_id: &str,
        deliverable_id: Uuid,
        ctx: &ProjectContext,
    ) -> Result<AutoFixOutcome> {
        let original = self
            .store
            .get_deliverable(organization_id, deliverable_id)
            .await?;
        Self::reject_binary(&original)?;

        let mut content = original.content.clone();
        let mut assessment = self.evaluator.evaluate(&content, ctx).await?;
        let mut validators = self.run_hard_validators(&content, original.deliverable_type);

        for pass in 0..self.config.max_improve_passes.max(1) {
            if assessment.pass && validators.iter().all(|v| v.pass) {
                break;
            }
            debug!(deliverable = %deliverable_id, pass, "running improve pass");
            content = self
                .evaluator
                .improve(&content, &assessment.suggestions, ctx)
                .await?;
            assessment = self.evaluator.evaluate(&content, ctx).await?;
            validators = self.run_hard_validators(&content, original.deliverable_type);
        }

        let snapshot = QualitySnapshot::new(assessment, validators);
        let verified = snapshot.verified;

        let mut revision = Deliverable::new(
            original.project_id,
            original.organization_id.clone(),
            format!("{}#fix-{}", original.assignment_key, Uuid::new_v4()),
            original.deliverable_type,
            content,
        );
        revision.campaign_id = original.campaign_id;
        revision.iteration_count = original.iteration_count + 1;
        revision.metadata.merge(
            MetadataPatch::new()
                .with_quality(snapshot.clone())
                .with_revision(RevisionLineage {
                    revision_of: Some(original.id),
                    last_revision_id: None,
                }),
        );
        let revision_id = revision.id;
        self.store.insert_deliverable(revision.clone()).await?;

        // Link the original forward to its current successor
        self.store
            .merge_metadata(
                organization_id,
                original.id,
                MetadataPatch::new().with_revision(RevisionLineage {
                    revision_of: original.metadata.revision.as_ref().and_then(|r| r.revision_of),
                    last_revision_id: Some(revision_id),
                }),
            )
            .await?;

        info!(
            original = %original.id,
            revision = %revision_id,
            verified,
            "auto-fix produced revision"
        );

        Ok(AutoFixOutcome {
            original_id: original.id,
            new_deliverable: revision,
            snapshot,
            verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::HeuristicEvaluator;
    use atelier_store::MemStore;

    fn gate(store: Arc<MemStore>) -> QualityGate {
        QualityGate::new(
            Arc::new(HeuristicEvaluator::default()),
            store,
            QualityConfig::default(),
        )
    }

    fn ctx() -> ProjectContext {
        ProjectContext::new("Launch our analytics product in Europe")
    }

    async fn seeded(store: &MemStore, deliverable_type: DeliverableType, content: &str) -> Uuid {
        let d = Deliverable::new(
            Uuid::new_v4(),
            "org-a",
            "plan/creation/copywriter/0",
            deliverable_type,
            content,
        );
        let id = d.id;
        store.insert_deliverable(d).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_auto_fix_verifies_weak_content() {
        let store = Arc::new(MemStore::new());
        let gate = gate(store.clone());
        let id = seeded(&store, DeliverableType::SocialMedia, "A short draft.").await;

        let outcome = gate.auto_fix("org-a", id, &ctx()).await.unwrap();
        assert!(outcome.verified);
        assert_eq!(outcome.new_deliverable.iteration_count, 1);

        // Original points at its successor
        let original = store.get_deliverable("org-a", id).await.unwrap();
        assert_eq!(
            original.metadata.last_revision_id(),
            Some(outcome.new_deliverable.id)
        );
        // Revision points back at the original
        assert_eq!(
            outcome
                .new_deliverable
                .metadata
                .revision
                .as_ref()
                .unwrap()
                .revision_of,
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_auto_fix_never_drops_failing_validator() {
        let store = Arc::new(MemStore::new());
        let gate = gate(store.clone());
        // The improve pass cannot remove a forbidden claim, so this stays
        // unverified and the failing rule must survive into the outcome
        let id = seeded(
            &store,
            DeliverableType::SocialMedia,
            "Our guaranteed analytics product will launch in Europe and it will transform \
             how your teams measure everything they ship across every market.",
        )
        .await;

        let outcome = gate.auto_fix("org-a", id, &ctx()).await.unwrap();
        assert!(!outcome.verified);
        let claims = outcome
            .snapshot
            .validators
            .iter()
            .find(|v| v.rule == "forbidden_claims")
            .expect("failing validator must be present");
        assert!(!claims.pass);
    }

    #[tokio::test]
    async fn test_auto_fix_rejects_binary_type() {
        let store = Arc::new(MemStore::new());
        let gate = gate(store.clone());
        let id = seeded(&store, DeliverableType::Image, "asset://image/art-director").await;

        let err = gate.auto_fix("org-a", id, &ctx()).await.unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED");
    }

    #[tokio::test]
    async fn test_auto_fix_rejects_png_extension() {
        let store = Arc::new(MemStore::new());
        let gate = gate(store.clone());
        // Text type, but the content is a binary asset path
        let id = seeded(&store, DeliverableType::SocialMedia, "uploads/hero.PNG").await;

        let err = gate.auto_fix("org-a", id, &ctx()).await.unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED");
    }

    #[tokio::test]
    async fn test_cross_tenant_auto_fix_is_not_found() {
        let store = Arc::new(MemStore::new());
        let gate = gate(store.clone());
        let id = seeded(&store, DeliverableType::SocialMedia, "A short draft.").await;

        let err = gate.auto_fix("org-b", id, &ctx()).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
