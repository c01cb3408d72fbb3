//! Configuration management for the orchestration core.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::AgentType;
use crate::services::logging::LogConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed for {field}: {reason}")]
    ValidationError { field: String, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub router: RouterConfig,
    pub orchestrator: OrchestratorConfig,
    pub audit: AuditConfig,
    pub archive: ArchiveConfig,
    pub logging: LogConfig,
}

/// Router thresholds and fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Agent used when every score is below `fallback_threshold`.
    pub default_agent: AgentType,
    /// Below this max score the router falls back to `default_agent`.
    pub fallback_threshold: f64,
    /// Scores above this become secondary agents.
    pub secondary_threshold: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_agent: AgentType::InvestorSummary,
            fallback_threshold: 0.1,
            secondary_threshold: 0.3,
        }
    }
}

/// Orchestrator execution limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Bound on each collaborator call; expiry becomes a timeout result.
    pub collaborator_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_secs: 300,
        }
    }
}

/// Audit trail bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Global cap; oldest entries are evicted first once exceeded.
    pub max_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// Archival artifact location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory that receives one JSON document per archived session.
    pub base_path: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_path: ".docuforge/archive".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from a toml file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates threshold and limit sanity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.router.fallback_threshold) {
            return Err(ConfigError::ValidationError {
                field: "router.fallback_threshold".to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.router.secondary_threshold) {
            return Err(ConfigError::ValidationError {
                field: "router.secondary_threshold".to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }
        if self.orchestrator.collaborator_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                field: "orchestrator.collaborator_timeout_secs".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.audit.max_entries == 0 {
            return Err(ConfigError::ValidationError {
                field: "audit.max_entries".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.router.default_agent, AgentType::InvestorSummary);
        assert!((config.router.fallback_threshold - 0.1).abs() < f64::EPSILON);
        assert!((config.router.secondary_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.orchestrator.collaborator_timeout_secs, 300);
        assert_eq!(config.audit.max_entries, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [router]
            default_agent = "base-shelf-prospectus"

            [orchestrator]
            collaborator_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.router.default_agent, AgentType::BaseShelfProspectus);
        assert_eq!(config.orchestrator.collaborator_timeout_secs, 30);
        // Untouched sections keep their defaults
        assert_eq!(config.audit.max_entries, 10_000);
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = Config::default();
        config.router.fallback_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.orchestrator.collaborator_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audit.max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/docuforge.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
