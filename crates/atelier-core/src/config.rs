//! Configuration management for Atelier
//!
//! Service-level settings loaded from `atelier.toml`: execution concurrency,
//! direct-modification latency bound, quality gate thresholds, and publish
//! integration endpoints.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Service-level Atelier configuration
///
/// Loaded from `atelier.toml` next to the binary, or defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtelierConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub revision: RevisionConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// Execution engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on concurrently dispatched assignments within a phase
    #[serde(default = "default_max_concurrent_assignments")]
    pub max_concurrent_assignments: usize,
}

/// Modification service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionConfig {
    /// Latency bound for direct-mode transforms; slower transforms are
    /// rejected rather than held open
    #[serde(default = "default_direct_timeout_ms")]
    pub direct_timeout_ms: u64,
}

/// Quality gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Improve/re-evaluate passes per fix-and-recheck call
    #[serde(default = "default_max_improve_passes")]
    pub max_improve_passes: usize,

    /// Overall score at or above which the soft assessment passes
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

/// Publication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Base URL for the platform's own hosting target
    #[serde(default = "default_hosted_base_url")]
    pub hosted_base_url: String,

    /// Base URL for the directly integrated third-party target
    #[serde(default = "default_webflow_base_url")]
    pub webflow_base_url: String,
}

// Default value providers

fn default_max_concurrent_assignments() -> usize {
    4
}

fn default_direct_timeout_ms() -> u64 {
    5_000
}

fn default_max_improve_passes() -> usize {
    1
}

fn default_pass_threshold() -> f64 {
    0.7
}

fn default_hosted_base_url() -> String {
    "https://cdn.atelier.internal".to_string()
}

fn default_webflow_base_url() -> String {
    "https://api.webflow.com".to_string()
}

impl AtelierConfig {
    /// Load configuration from a TOML file or use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| crate::AtelierError::Internal(format!("Failed to parse config: {}", e)))
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_assignments: default_max_concurrent_assignments(),
        }
    }
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            direct_timeout_ms: default_direct_timeout_ms(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_improve_passes: default_max_improve_passes(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            hosted_base_url: default_hosted_base_url(),
            webflow_base_url: default_webflow_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtelierConfig::default();
        assert_eq!(config.engine.max_concurrent_assignments, 4);
        assert_eq!(config.quality.max_improve_passes, 1);
        assert!((config.quality.pass_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AtelierConfig::load_or_default(Path::new("/nonexistent/atelier.toml")).unwrap();
        assert_eq!(config.revision.direct_timeout_ms, 5_000);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atelier.toml");
        std::fs::write(&path, "[quality]\npass_threshold = 0.8\n").unwrap();

        let config = AtelierConfig::load_or_default(&path).unwrap();
        assert!((config.quality.pass_threshold - 0.8).abs() < f64::EPSILON);
        // Unspecified sections keep their defaults
        assert_eq!(config.engine.max_concurrent_assignments, 4);
    }
}
