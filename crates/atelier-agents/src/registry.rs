//! Static catalog of available agent definitions
//!
//! Pure lookup, no state. The plan builder allocates agents per phase by
//! category; the registry never changes during a run.

use atelier_core::DeliverableType;
use serde::{Deserialize, Serialize};

/// Functional category an agent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    Strategy,
    Content,
    Creative,
    Distribution,
    Analytics,
}

impl std::fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strategy => write!(f, "strategy"),
            Self::Content => write!(f, "content"),
            Self::Creative => write!(f, "creative"),
            Self::Distribution => write!(f, "distribution"),
            Self::Analytics => write!(f, "analytics"),
        }
    }
}

/// One agent definition in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: String,
    pub role: String,
    pub category: AgentCategory,
    /// Deliverable types this agent is expected to produce
    pub deliverable_types: Vec<DeliverableType>,
}

/// Static agent catalog
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentDefinition>) -> Self {
        Self { agents }
    }

    /// The standard production catalog
    pub fn standard() -> Self {
        use AgentCategory::*;
        use DeliverableType::*;

        let def = |id: &str, role: &str, category, types: Vec<DeliverableType>| AgentDefinition {
            id: id.to_string(),
            role: role.to_string(),
            category,
            deliverable_types: types,
        };

        Self::new(vec![
            def(
                "brand-strategist",
                "Brand Strategist",
                Strategy,
                vec![StrategicBrief],
            ),
            def(
                "campaign-planner",
                "Campaign Planner",
                Strategy,
                vec![StrategicBrief, Deck],
            ),
            def("copywriter", "Copywriter", Content, vec![AdCopy, LandingPage]),
            def(
                "content-writer",
                "Long-form Content Writer",
                Content,
                vec![BlogArticle],
            ),
            def(
                "social-media-manager",
                "Social Media Manager",
                Content,
                vec![SocialMedia],
            ),
            def(
                "email-marketer",
                "Email Marketer",
                Content,
                vec![EmailSequence],
            ),
            def(
                "video-scripter",
                "Video Scriptwriter",
                Creative,
                vec![VideoScript],
            ),
            def("art-director", "Art Director", Creative, vec![Image, Deck]),
            def(
                "paid-media-specialist",
                "Paid Media Specialist",
                Distribution,
                vec![AdCopy],
            ),
            def(
                "performance-analyst",
                "Performance Analyst",
                Analytics,
                vec![Deck],
            ),
        ])
    }

    /// Look up an agent by id
    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// All agents in a category, in catalog order
    pub fn by_category(&self, category: AgentCategory) -> Vec<&AgentDefinition> {
        self.agents
            .iter()
            .filter(|a| a.category == category)
            .collect()
    }

    /// First agent able to produce the given deliverable type
    pub fn for_type(&self, deliverable_type: DeliverableType) -> Option<&AgentDefinition> {
        self.agents
            .iter()
            .find(|a| a.deliverable_types.contains(&deliverable_type))
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_lookup() {
        let registry = AgentRegistry::standard();

        let copywriter = registry.get("copywriter").unwrap();
        assert_eq!(copywriter.category, AgentCategory::Content);
        assert!(copywriter
            .deliverable_types
            .contains(&DeliverableType::AdCopy));

        assert!(registry.get("ghost").is_none());
    }

    #[test]
    fn test_by_category() {
        let registry = AgentRegistry::standard();
        let strategists = registry.by_category(AgentCategory::Strategy);
        assert_eq!(strategists.len(), 2);
        assert_eq!(strategists[0].id, "brand-strategist");
    }

    #[test]
    fn test_for_type_covers_core_types() {
        let registry = AgentRegistry::standard();
        for t in [
            DeliverableType::StrategicBrief,
            DeliverableType::SocialMedia,
            DeliverableType::EmailSequence,
            DeliverableType::BlogArticle,
            DeliverableType::AdCopy,
            DeliverableType::VideoScript,
            DeliverableType::Image,
            DeliverableType::Deck,
        ] {
            assert!(registry.for_type(t).is_some(), "no agent for {}", t);
        }
    }
}
