//! Typed deliverable metadata and merge-patch updates
//!
//! Metadata is a tagged set of known sections (quality, publish state,
//! revision lineage, approval) plus an explicit `extra` map for forward
//! compatibility. Updates are section-level merge patches: a patch replaces
//! only the sections it carries, so concurrent non-conflicting writers (e.g.
//! quality metadata vs. publish metadata) never clobber each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{QualityAssessment, ValidatorResult};

/// Snapshot of the quality gate's verdict at evaluation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySnapshot {
    pub assessment: QualityAssessment,
    pub validators: Vec<ValidatorResult>,
    /// True iff the assessment passed AND every hard validator passed
    pub verified: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl QualitySnapshot {
    pub fn new(assessment: QualityAssessment, validators: Vec<ValidatorResult>) -> Self {
        let verified = assessment.pass && validators.iter().all(|v| v.pass);
        Self {
            assessment,
            validators,
            verified,
            evaluated_at: Utc::now(),
        }
    }
}

/// Publish state recorded on every publish attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishState {
    pub target: String,
    /// Set for immediate publication
    pub url: Option<String>,
    /// Set for deferred publication
    pub workflow_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

/// Revision lineage links
///
/// A deliverable has at most one current successor; `last_revision_id`
/// always points at the most recent revision, forming a chain rather than
/// a tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionLineage {
    /// Deliverable this one was revised from
    pub revision_of: Option<Uuid>,
    /// Most recent successor created by auto-fix or modification
    pub last_revision_id: Option<Uuid>,
}

/// Approval details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalInfo {
    pub approver_id: String,
    pub feedback: Option<String>,
    pub approved_at: DateTime<Utc>,
}

/// Tagged metadata attached to a deliverable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliverableMetadata {
    pub quality: Option<QualitySnapshot>,
    pub publish: Option<PublishState>,
    pub revision: Option<RevisionLineage>,
    pub approval: Option<ApprovalInfo>,
    /// Forward-compatible escape hatch for unmodeled fields
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Section-level merge patch (additive, last-writer-wins per section)
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub quality: Option<QualitySnapshot>,
    pub publish: Option<PublishState>,
    pub revision: Option<RevisionLineage>,
    pub approval: Option<ApprovalInfo>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetadataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: QualitySnapshot) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_publish(mut self, publish: PublishState) -> Self {
        self.publish = Some(publish);
        self
    }

    pub fn with_revision(mut self, revision: RevisionLineage) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_approval(mut self, approval: ApprovalInfo) -> Self {
        self.approval = Some(approval);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl DeliverableMetadata {
    /// Apply a merge patch: only the sections present in the patch change,
    /// `extra` keys merge individually.
    pub fn merge(&mut self, patch: MetadataPatch) {
        if let Some(quality) = patch.quality {
            self.quality = Some(quality);
        }
        if let Some(publish) = patch.publish {
            self.publish = Some(publish);
        }
        if let Some(revision) = patch.revision {
            self.revision = Some(revision);
        }
        if let Some(approval) = patch.approval {
            self.approval = Some(approval);
        }
        for (key, value) in patch.extra {
            self.extra.insert(key, value);
        }
    }

    /// Most recent successor deliverable, if any
    pub fn last_revision_id(&self) -> Option<Uuid> {
        self.revision.as_ref().and_then(|r| r.last_revision_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualityAssessment;

    fn passing_assessment() -> QualityAssessment {
        QualityAssessment {
            pass: true,
            clarity: 0.9,
            relevance: 0.8,
            completeness: 0.85,
            overall: 0.85,
            suggestions: vec![],
        }
    }

    #[test]
    fn test_verified_requires_both_passes() {
        let snapshot = QualitySnapshot::new(
            passing_assessment(),
            vec![ValidatorResult {
                rule: "length_bounds".to_string(),
                pass: false,
                detail: "too short".to_string(),
            }],
        );
        assert!(!snapshot.verified);

        let snapshot = QualitySnapshot::new(passing_assessment(), vec![]);
        assert!(snapshot.verified);
    }

    #[test]
    fn test_merge_is_section_scoped() {
        let mut metadata = DeliverableMetadata::default();
        metadata.merge(MetadataPatch::new().with_quality(QualitySnapshot::new(
            passing_assessment(),
            vec![],
        )));

        // A publish-only patch must not touch the quality section
        metadata.merge(MetadataPatch::new().with_publish(PublishState {
            target: "hosted".to_string(),
            url: Some("https://cdn.example/d/1".to_string()),
            workflow_id: None,
            at: Utc::now(),
        }));

        assert!(metadata.quality.is_some());
        assert!(metadata.publish.is_some());
        assert!(metadata.approval.is_none());
    }

    #[test]
    fn test_extra_keys_merge_individually() {
        let mut metadata = DeliverableMetadata::default();
        metadata.merge(MetadataPatch::new().with_extra("locale", serde_json::json!("en-US")));
        metadata.merge(MetadataPatch::new().with_extra("variant_pack", serde_json::json!("a")));

        assert_eq!(metadata.extra.len(), 2);
        assert_eq!(metadata.extra["locale"], serde_json::json!("en-US"));
    }
}
