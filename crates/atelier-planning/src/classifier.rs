//! Request classification
//!
//! Deterministic keyword-driven classification of a client request into a
//! project type, complexity tier, expanded deliverable scope, and channel
//! strategy. Deterministic given identical input; no external side effects.

use atelier_core::{Channel, Complexity, DeliverableType, ProjectType, RequestAnalysis};

/// Classifies client requests into a structured analysis
pub struct RequestClassifier;

impl RequestClassifier {
    /// Classify a request into `RequestAnalysis`
    pub fn classify(request: &str) -> RequestAnalysis {
        let lowered = request.to_lowercase();
        let word_count = lowered.split_whitespace().count();

        let project_type = Self::project_type(&lowered);
        let channels = Self::channels(&lowered);
        let complexity = Self::complexity(&lowered, word_count, channels.len());
        let expanded_scope = Self::expand_scope(project_type, &channels, &lowered);

        RequestAnalysis {
            project_type,
            complexity,
            expanded_scope,
            channels,
        }
    }

    fn project_type(lowered: &str) -> ProjectType {
        let has = |needles: &[&str]| needles.iter().any(|n| lowered.contains(n));

        if has(&["launch", "release", "go-to-market", "go to market"]) {
            ProjectType::ProductLaunch
        } else if has(&["rebrand", "brand awareness", "brand campaign", "branding"]) {
            ProjectType::BrandCampaign
        } else if has(&["blog", "content program", "content calendar", "editorial", "seo"]) {
            ProjectType::ContentProgram
        } else if has(&["lead", "pipeline", "demo requests", "signups", "sign-ups"]) {
            ProjectType::LeadGeneration
        } else {
            ProjectType::General
        }
    }

    fn channels(lowered: &str) -> Vec<Channel> {
        let mut channels = Vec::new();
        let mut add = |channel: Channel| {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        };

        if ["meta", "facebook", "instagram"].iter().any(|n| lowered.contains(n)) {
            add(Channel::Meta);
        }
        if ["google", "search ads", "sem", "ppc"].iter().any(|n| lowered.contains(n)) {
            add(Channel::Google);
        }
        if lowered.contains("linkedin") {
            add(Channel::Linkedin);
        }
        if lowered.contains("tiktok") {
            add(Channel::Tiktok);
        }
        if ["email", "newsletter", "nurture"].iter().any(|n| lowered.contains(n)) {
            add(Channel::Email);
        }
        if ["seo", "organic", "blog"].iter().any(|n| lowered.contains(n)) {
            add(Channel::Organic);
        }

        // No declared channel strategy: fall back to organic
        if channels.is_empty() {
            channels.push(Channel::Organic);
        }
        channels
    }

    fn complexity(lowered: &str, word_count: usize, channel_count: usize) -> Complexity {
        let enterprise_markers = ["global", "worldwide", "enterprise", "multi-market", "localized"];
        if enterprise_markers.iter().any(|n| lowered.contains(n)) || word_count > 80 {
            Complexity::Enterprise
        } else if word_count > 30 || channel_count >= 3 {
            Complexity::Complex
        } else {
            Complexity::Standard
        }
    }

    /// Expand the literal ask into the deliverable types it implies
    fn expand_scope(
        project_type: ProjectType,
        channels: &[Channel],
        lowered: &str,
    ) -> Vec<DeliverableType> {
        use DeliverableType::*;

        let mut scope = Vec::new();
        let mut add = |t: DeliverableType, scope: &mut Vec<DeliverableType>| {
            if !scope.contains(&t) {
                scope.push(t);
            }
        };

        // Every project starts from a strategy document
        add(StrategicBrief, &mut scope);

        match project_type {
            ProjectType::ProductLaunch => {
                for t in [AdCopy, SocialMedia, EmailSequence, LandingPage] {
                    add(t, &mut scope);
                }
            }
            ProjectType::BrandCampaign => {
                for t in [SocialMedia, VideoScript, Image] {
                    add(t, &mut scope);
                }
            }
            ProjectType::ContentProgram => {
                for t in [BlogArticle, SocialMedia] {
                    add(t, &mut scope);
                }
            }
            ProjectType::LeadGeneration => {
                for t in [AdCopy, EmailSequence, LandingPage] {
                    add(t, &mut scope);
                }
            }
            ProjectType::General => {
                add(SocialMedia, &mut scope);
            }
        }

        // Channel-implied additions
        for channel in channels {
            match channel {
                Channel::Meta | Channel::Google | Channel::Linkedin => add(AdCopy, &mut scope),
                Channel::Tiktok => {
                    add(AdCopy, &mut scope);
                    add(VideoScript, &mut scope);
                }
                Channel::Email => add(EmailSequence, &mut scope),
                Channel::Organic => add(BlogArticle, &mut scope),
            }
        }

        // Explicit asks that cut across project types
        if lowered.contains("video") {
            add(VideoScript, &mut scope);
        }
        if ["deck", "presentation", "pitch"].iter().any(|n| lowered.contains(n)) {
            add(Deck, &mut scope);
        }

        scope
    }
}
