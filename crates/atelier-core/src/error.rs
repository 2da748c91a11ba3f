//! Unified error types for Atelier

use thiserror::Error;

/// Unified error type for all Atelier operations
///
/// Each variant maps to one taxonomy code surfaced to API callers via
/// [`AtelierError::code`]. Entity-absent and not-owned-by-caller are the
/// same variant on purpose: they must be indistinguishable externally.
#[derive(Error, Debug)]
pub enum AtelierError {
    // Caller-correctable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // Operation attempted, underlying transform/integration failed
    #[error("Modification failed: {0}")]
    ModificationFailed(String),

    #[error("Revision failed: {0}")]
    RevisionFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Suggestions failed: {0}")]
    SuggestionsFailed(String),

    // Declared integration failure - triggers fallback, never surfaced raw
    #[error("Integration error: {0}")]
    Integration(String),

    // Infrastructure
    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtelierError {
    /// Stable taxonomy code for API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::CampaignNotFound(_) => "CAMPAIGN_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unsupported(_) => "UNSUPPORTED",
            Self::ModificationFailed(_) => "MODIFICATION_FAILED",
            Self::RevisionFailed(_) => "REVISION_FAILED",
            Self::PublishFailed(_) => "PUBLISH_FAILED",
            Self::SuggestionsFailed(_) => "SUGGESTIONS_FAILED",
            Self::Integration(_) => "INTEGRATION_ERROR",
            Self::Store(_) | Self::Io(_) | Self::Serialization(_) | Self::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }
}

/// Result type alias using AtelierError
pub type Result<T> = std::result::Result<T, AtelierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_codes() {
        assert_eq!(
            AtelierError::InvalidInput("x".into()).code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            AtelierError::CampaignNotFound("c-1".into()).code(),
            "CAMPAIGN_NOT_FOUND"
        );
        assert_eq!(
            AtelierError::Store("down".into()).code(),
            "INTERNAL_ERROR"
        );
    }
}
