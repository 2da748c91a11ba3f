//! Agent invocation seam
//!
//! Content generation is an external collaborator: the engine hands an
//! assignment plus a brief to an [`AgentInvoker`] and gets back text (or a
//! failure). The [`TemplateInvoker`] is the deterministic in-process
//! implementation used in development and tests.

use async_trait::async_trait;
use atelier_core::{AgentAssignment, Channel, DeliverableType, ProjectType, Result};

/// Context an agent receives alongside its assignment
#[derive(Debug, Clone)]
pub struct AgentBrief {
    /// The original client request text
    pub project_request: String,
    pub project_type: ProjectType,
    pub channels: Vec<Channel>,
}

/// Output of one agent invocation
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub content: String,
}

/// Opaque content-generation capability
///
/// Implementations may call out to an LLM service or run locally; the engine
/// treats every invocation as a blocking-but-concurrent operation bounded by
/// the surrounding phase.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, assignment: &AgentAssignment, brief: &AgentBrief)
        -> Result<AgentOutput>;
}

/// Deterministic template-based invoker
///
/// Produces well-formed content for every text deliverable type, keyed only
/// on the assignment and brief, so plan execution is reproducible.
#[derive(Debug, Clone, Default)]
pub struct TemplateInvoker;

impl TemplateInvoker {
    pub fn new() -> Self {
        Self
    }

    fn channels_line(brief: &AgentBrief) -> String {
        if brief.channels.is_empty() {
            "organic".to_string()
        } else {
            brief
                .channels
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

#[async_trait]
impl AgentInvoker for TemplateInvoker {
    async fn invoke(
        &self,
        assignment: &AgentAssignment,
        brief: &AgentBrief,
    ) -> Result<AgentOutput> {
        let request = brief.project_request.trim();
        let channels = Self::channels_line(brief);

        let content = match assignment.deliverable_type {
            DeliverableType::StrategicBrief => format!(
                "Objective\nPosition the offering described as \"{request}\" for a {} initiative.\n\n\
                 Audience\nDecision makers reached via {channels}.\n\n\
                 Key message\nLead with the concrete outcome the client asked for, \
                 supported by proof points gathered during discovery.\n\n\
                 Success criteria\nPipeline contribution and assisted conversions per channel.",
                brief.project_type
            ),
            DeliverableType::SocialMedia => format!(
                "Launching soon: {request}. Here is what changes for you, in one thread. \
                 Follow along for the rollout across {channels}. \
                 We built this after listening to hundreds of customer conversations."
            ),
            DeliverableType::EmailSequence => format!(
                "Subject: A first look at what you asked for\n\n\
                 Hi there,\n\nYou told us what was missing. {request} is our answer. \
                 Over the next three emails we will walk through what it does, who it is for, \
                 and how to get started.\n\n\
                 Subject: Under the hood\n\nA closer look at how it works in practice.\n\n\
                 Subject: Your next step\n\nReady when you are - reply and we will set you up."
            ),
            DeliverableType::BlogArticle => format!(
                "# Why we built it\n\n{request}\n\n\
                 Every team we spoke to described the same gap between what they planned and what \
                 actually shipped. This article walks through the problem as we heard it, the \
                 approach we took, and what the first results look like.\n\n\
                 ## The problem\n\nPlanning tools promise alignment but deliver overhead. Teams \
                 spend more time reporting status than changing it.\n\n\
                 ## Our approach\n\nWe started from the outcome and worked backwards, cutting \
                 every step that did not move the result. The channels we prioritized ({channels}) \
                 reflect where our audience already spends attention.\n\n\
                 ## What comes next\n\nWe are rolling this out in stages and publishing what we \
                 learn along the way."
            ),
            DeliverableType::AdCopy => format!(
                "Stop planning. Start shipping.\n{request}\nSee it in action - book a demo today."
            ),
            DeliverableType::VideoScript => format!(
                "Scene 1 - Cold open\nA cluttered desk, a planning board full of stale tickets.\n\n\
                 Scene 2 - The turn\nVoiceover: \"{request}\"\n\n\
                 Scene 3 - Product\nScreen capture of the core flow, 12 seconds.\n\n\
                 Scene 4 - Close\nLogo, tagline, call to action."
            ),
            DeliverableType::LandingPage => format!(
                "# The shortest path from idea to launch\n\n{request}\n\n\
                 ## How it works\nThree steps, no onboarding call required.\n\n\
                 ## Proof\nTeams across {channels} report faster cycles within the first month.\n\n\
                 ## Get started\nCreate an account and launch your first campaign today."
            ),
            DeliverableType::Deck => format!(
                "Slide 1: Title - {request}\n\
                 Slide 2: The problem in one chart\n\
                 Slide 3: Approach and timeline\n\
                 Slide 4: Channel plan ({channels})\n\
                 Slide 5: Budget and expected return\n\
                 Slide 6: Next steps"
            ),
            // Binary types carry an asset reference, not renderable text
            DeliverableType::Image | DeliverableType::Video => format!(
                "asset://{}/{}",
                assignment.deliverable_type, assignment.agent_id
            ),
        };

        Ok(AgentOutput { content })
    }
}
