//! Core type definitions for Atelier orchestration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metadata::DeliverableMetadata;

/// Deliverable types producible by the agent team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliverableType {
    StrategicBrief,
    SocialMedia,
    EmailSequence,
    BlogArticle,
    AdCopy,
    VideoScript,
    LandingPage,
    Deck,
    Image,
    Video,
}

impl DeliverableType {
    /// Binary deliverables carry opaque payloads the text pipeline
    /// (auto-fix, direct modification) cannot operate on.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl std::fmt::Display for DeliverableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrategicBrief => write!(f, "strategic-brief"),
            Self::SocialMedia => write!(f, "social-media"),
            Self::EmailSequence => write!(f, "email-sequence"),
            Self::BlogArticle => write!(f, "blog-article"),
            Self::AdCopy => write!(f, "ad-copy"),
            Self::VideoScript => write!(f, "video-script"),
            Self::LandingPage => write!(f, "landing-page"),
            Self::Deck => write!(f, "deck"),
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for DeliverableType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strategic-brief" | "strategic_brief" => Ok(Self::StrategicBrief),
            "social-media" | "social_media" => Ok(Self::SocialMedia),
            "email-sequence" | "email_sequence" => Ok(Self::EmailSequence),
            "blog-article" | "blog_article" => Ok(Self::BlogArticle),
            "ad-copy" | "ad_copy" => Ok(Self::AdCopy),
            "video-script" | "video_script" => Ok(Self::VideoScript),
            "landing-page" | "landing_page" => Ok(Self::LandingPage),
            "deck" => Ok(Self::Deck),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(format!("Invalid deliverable type: {}", s)),
        }
    }
}

/// Deliverable lifecycle status
///
/// Legal transitions: `draft -> revising <-> draft -> approved -> published`.
/// Approval and publication are blocked while a revision is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
    #[default]
    Draft,
    Revising,
    Approved,
    Published,
}

impl DeliverableStatus {
    /// Check whether a transition to `next` is legal
    pub fn can_transition(&self, next: DeliverableStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Revising)
                | (Self::Revising, Self::Draft)
                | (Self::Draft, Self::Approved)
                | (Self::Approved, Self::Published)
        )
    }
}

impl std::fmt::Display for DeliverableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Revising => write!(f, "revising"),
            Self::Approved => write!(f, "approved"),
            Self::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for DeliverableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "revising" => Ok(Self::Revising),
            "approved" => Ok(Self::Approved),
            "published" => Ok(Self::Published),
            _ => Err(format!("Invalid deliverable status: {}", s)),
        }
    }
}

/// Marketing channels a plan can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Meta,
    Google,
    Linkedin,
    Tiktok,
    Email,
    Organic,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Meta => write!(f, "meta"),
            Self::Google => write!(f, "google"),
            Self::Linkedin => write!(f, "linkedin"),
            Self::Tiktok => write!(f, "tiktok"),
            Self::Email => write!(f, "email"),
            Self::Organic => write!(f, "organic"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meta" | "facebook" | "instagram" => Ok(Self::Meta),
            "google" | "search" => Ok(Self::Google),
            "linkedin" => Ok(Self::Linkedin),
            "tiktok" => Ok(Self::Tiktok),
            "email" => Ok(Self::Email),
            "organic" | "seo" => Ok(Self::Organic),
            _ => Err(format!("Invalid channel: {}", s)),
        }
    }
}

/// Project type classification derived from a client request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    ProductLaunch,
    BrandCampaign,
    ContentProgram,
    LeadGeneration,
    #[default]
    General,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProductLaunch => write!(f, "product_launch"),
            Self::BrandCampaign => write!(f, "brand_campaign"),
            Self::ContentProgram => write!(f, "content_program"),
            Self::LeadGeneration => write!(f, "lead_generation"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Complexity tier for a classified request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Standard,
    Complex,
    Enterprise,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Complex => write!(f, "complex"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// A natural-language client request
///
/// Ephemeral input - not persisted beyond the Project it spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRequest {
    /// Free-text request
    pub request: String,
    /// Owning client identifier
    pub client_id: String,
    /// Arbitrary context supplied by the caller
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl ClientRequest {
    pub fn new(request: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            client_id: client_id.into(),
            context: serde_json::Map::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// Structured classification of a client request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestAnalysis {
    /// Classified project type
    pub project_type: ProjectType,
    /// Complexity tier
    pub complexity: Complexity,
    /// Deliverable types implied by the stated goal but not explicitly asked for
    pub expanded_scope: Vec<DeliverableType>,
    /// Declared channel strategy
    pub channels: Vec<Channel>,
}

/// One agent assignment inside a plan phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAssignment {
    /// Agent identifier from the registry
    pub agent_id: String,
    /// Role the agent plays in this phase
    pub role: String,
    /// Deliverable type this assignment produces
    pub deliverable_type: DeliverableType,
    /// Expected deliverable count
    pub expected_deliverables: u32,
}

/// Phase in an execution plan
///
/// Phases execute strictly in declared order; assignments within a phase
/// execute concurrently with no ordering guarantee among them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPhase {
    pub name: String,
    pub description: String,
    pub assignments: Vec<AgentAssignment>,
    pub estimated_deliverables: u32,
}

impl PlanPhase {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            assignments: Vec::new(),
            estimated_deliverables: 0,
        }
    }

    pub fn with_assignment(mut self, assignment: AgentAssignment) -> Self {
        self.estimated_deliverables += assignment.expected_deliverables;
        self.assignments.push(assignment);
        self
    }
}

/// Immutable execution plan for a project
///
/// Re-planning creates a new plan; a plan is never mutated once execution
/// starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Ordered phases
    pub phases: Vec<PlanPhase>,
    /// Derived, cached agent count
    pub total_agents: u32,
    /// Derived, cached deliverable count
    pub total_deliverables: u32,
    /// Gate identifiers required before the project is considered complete,
    /// one per deliverable type in the core scope (`gate:<type>`)
    pub quality_gates: Vec<String>,
    /// Structured request classification
    pub analysis: RequestAnalysis,
}

impl ExecutionPlan {
    pub fn new(project_id: Uuid, analysis: RequestAnalysis) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            phases: Vec::new(),
            total_agents: 0,
            total_deliverables: 0,
            quality_gates: Vec::new(),
            analysis,
        }
    }

    /// Append a phase and refresh the derived totals
    pub fn push_phase(&mut self, phase: PlanPhase) {
        self.total_agents += phase.assignments.len() as u32;
        self.total_deliverables += phase.estimated_deliverables;
        self.phases.push(phase);
    }

    /// Deliverable type required by a gate identifier, if it parses
    pub fn gate_type(gate: &str) -> Option<DeliverableType> {
        gate.strip_prefix("gate:")?.parse().ok()
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planned,
    Executing,
    Completed,
    Failed,
}

/// A client project owning one plan and its deliverables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: String,
    pub client_id: String,
    pub request: String,
    pub status: ProjectStatus,
    pub plan: Option<ExecutionPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(organization_id: impl Into<String>, request: &ClientRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            client_id: request.client_id.clone(),
            request: request.request.clone(),
            status: ProjectStatus::Planned,
            plan: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The central mutable entity: a single produced artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: Uuid,
    pub project_id: Uuid,
    pub organization_id: String,
    /// Owning campaign, when the deliverable belongs to one
    pub campaign_id: Option<Uuid>,
    /// Stable key identifying the plan assignment slot that produced this
    /// deliverable; re-execution must not duplicate rows with the same key
    pub assignment_key: String,
    pub deliverable_type: DeliverableType,
    /// Opaque text or structured payload
    pub content: String,
    pub metadata: DeliverableMetadata,
    pub iteration_count: u32,
    pub status: DeliverableStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deliverable {
    pub fn new(
        project_id: Uuid,
        organization_id: impl Into<String>,
        assignment_key: impl Into<String>,
        deliverable_type: DeliverableType,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            organization_id: organization_id.into(),
            campaign_id: None,
            assignment_key: assignment_key.into(),
            deliverable_type,
            content: content.into(),
            metadata: DeliverableMetadata::default(),
            iteration_count: 0,
            status: DeliverableStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_campaign(mut self, campaign_id: Uuid) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }
}

/// How a modification instruction is processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationMode {
    /// Synchronous in-place content transform
    #[default]
    Direct,
    /// Asynchronous re-entry into the plan/execute loop
    Workflow,
}

impl std::fmt::Display for ModificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Workflow => write!(f, "workflow"),
        }
    }
}

impl std::str::FromStr for ModificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "workflow" => Ok(Self::Workflow),
            _ => Err(format!("Invalid modification mode: {}", s)),
        }
    }
}

/// Append-only audit record of a modification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationRecord {
    pub id: Uuid,
    pub deliverable_id: Uuid,
    pub instruction: String,
    pub mode: ModificationMode,
    pub actor_id: String,
    /// Resulting action (e.g. "revised", "queued")
    pub action: String,
    pub new_deliverable_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ModificationRecord {
    pub fn new(
        deliverable_id: Uuid,
        instruction: impl Into<String>,
        mode: ModificationMode,
        actor_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            deliverable_id,
            instruction: instruction.into(),
            mode,
            actor_id: actor_id.into(),
            action: action.into(),
            new_deliverable_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_new_deliverable(mut self, id: Uuid) -> Self {
        self.new_deliverable_id = Some(id);
        self
    }
}

/// Kind of deferred workflow job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Revision,
    Publish,
    VariantGeneration,
}

/// Terminal-status-only workflow lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

/// A deferred job record, fire-and-forget from the caller's perspective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub organization_id: String,
    pub kind: WorkflowKind,
    pub status: WorkflowStatus,
    /// Human-readable goal or failure detail
    pub detail: Option<String>,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(organization_id: impl Into<String>, kind: WorkflowKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            kind,
            status: WorkflowStatus::Queued,
            detail: None,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Historical performance metrics for a campaign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
}

/// A marketing campaign owning deliverables and predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub organization_id: String,
    pub name: String,
    pub industry: String,
    pub metrics: CampaignMetrics,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        organization_id: impl Into<String>,
        name: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            name: name.into(),
            industry: industry.into(),
            metrics: CampaignMetrics::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: CampaignMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Confidence interval around a predicted value
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Industry benchmark a prediction is compared against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryBenchmark {
    pub industry: String,
    pub avg_ctr: f64,
    pub avg_cpc: f64,
    pub avg_roi: f64,
}

/// A campaign forecast
///
/// Written once per forecast request; later predictions for the same campaign
/// supersede earlier ones, they never overwrite them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub predicted_roi: f64,
    pub predicted_ctr: f64,
    pub predicted_cpc: f64,
    pub predicted_conversions: f64,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    pub roi_interval: ConfidenceInterval,
    pub recommended_budget: f64,
    pub recommended_channels: Vec<Channel>,
    pub risk_factors: Vec<String>,
    pub benchmark: IndustryBenchmark,
    pub created_at: DateTime<Utc>,
}

/// Interaction type recorded into the feedback memory store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Approval,
    Revision,
    Modification,
    Publication,
}

/// One feedback-loop record, emitted independent of the primary transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub organization_id: String,
    pub interaction_type: InteractionType,
    pub outcome: String,
    pub deliverable_id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub original_content: String,
    pub feedback_content: String,
    pub iteration_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Weights for composite creative-variant scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Headline weight (default 0.35)
    pub headline: f64,
    /// Call-to-action weight (default 0.25)
    pub cta: f64,
    /// Visual weight (default 0.15)
    pub visual: f64,
    /// Campaign relevance weight (default 0.25)
    pub relevance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            headline: 0.35,
            cta: 0.25,
            visual: 0.15,
            relevance: 0.25,
        }
    }
}

impl ScoreWeights {
    /// Calculate weighted composite from individual scores (0.0 - 1.0 each)
    pub fn calculate(&self, headline: f64, cta: f64, visual: f64, relevance: f64) -> f64 {
        self.headline * headline + self.cta * cta + self.visual * visual + self.relevance * relevance
    }
}

/// Transient result of the quality gate's soft evaluation
///
/// Not a first-class stored entity; persisted only as a metadata snapshot on
/// the deliverable at evaluation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub pass: bool,
    /// Clarity score (0.0 - 1.0)
    pub clarity: f64,
    /// Relevance to project context (0.0 - 1.0)
    pub relevance: f64,
    /// Completeness score (0.0 - 1.0)
    pub completeness: f64,
    /// Weighted overall score
    pub overall: f64,
    pub suggestions: Vec<String>,
}

/// One hard-validator outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorResult {
    pub rule: String,
    pub pass: bool,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliverable_type_parsing() {
        let t: DeliverableType = "strategic-brief".parse().unwrap();
        assert_eq!(t, DeliverableType::StrategicBrief);
        assert_eq!(t.to_string(), "strategic-brief");
        assert!("hologram".parse::<DeliverableType>().is_err());
    }

    #[test]
    fn test_binary_types() {
        assert!(DeliverableType::Image.is_binary());
        assert!(DeliverableType::Video.is_binary());
        assert!(!DeliverableType::VideoScript.is_binary());
        assert!(!DeliverableType::AdCopy.is_binary());
    }

    #[test]
    fn test_status_transitions() {
        use DeliverableStatus::*;
        assert!(Draft.can_transition(Revising));
        assert!(Revising.can_transition(Draft));
        assert!(Draft.can_transition(Approved));
        assert!(Approved.can_transition(Published));

        assert!(!Revising.can_transition(Approved));
        assert!(!Revising.can_transition(Published));
        assert!(!Published.can_transition(Draft));
        assert!(!Approved.can_transition(Revising));
    }

    #[test]
    fn test_plan_totals() {
        let analysis = RequestAnalysis {
            project_type: ProjectType::ProductLaunch,
            complexity: Complexity::Standard,
            expanded_scope: vec![DeliverableType::AdCopy],
            channels: vec![Channel::Meta],
        };
        let mut plan = ExecutionPlan::new(Uuid::new_v4(), analysis);

        plan.push_phase(
            PlanPhase::new("strategy", "Strategy work").with_assignment(AgentAssignment {
                agent_id: "strategist".to_string(),
                role: "brand strategist".to_string(),
                deliverable_type: DeliverableType::StrategicBrief,
                expected_deliverables: 1,
            }),
        );
        plan.push_phase(
            PlanPhase::new("creation", "Content work")
                .with_assignment(AgentAssignment {
                    agent_id: "copywriter".to_string(),
                    role: "copywriter".to_string(),
                    deliverable_type: DeliverableType::AdCopy,
                    expected_deliverables: 2,
                })
                .with_assignment(AgentAssignment {
                    agent_id: "social".to_string(),
                    role: "social media manager".to_string(),
                    deliverable_type: DeliverableType::SocialMedia,
                    expected_deliverables: 3,
                }),
        );

        assert_eq!(plan.total_agents, 3);
        assert_eq!(plan.total_deliverables, 6);
    }

    #[test]
    fn test_gate_type_parsing() {
        assert_eq!(
            ExecutionPlan::gate_type("gate:ad-copy"),
            Some(DeliverableType::AdCopy)
        );
        assert_eq!(ExecutionPlan::gate_type("coverage"), None);
    }

    #[test]
    fn test_score_weights() {
        let weights = ScoreWeights::default();
        let score = weights.calculate(1.0, 1.0, 1.0, 1.0);
        assert!((score - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_channel_aliases() {
        assert_eq!("facebook".parse::<Channel>().unwrap(), Channel::Meta);
        assert_eq!("seo".parse::<Channel>().unwrap(), Channel::Organic);
    }
}
