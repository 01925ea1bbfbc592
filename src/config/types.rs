//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/nexushub/) and project (.nexushub/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{ai, network};
use crate::types::{HubError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Completion service settings
    pub ai: AiConfig,

    /// Persistence settings
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            ai: AiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `HubError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("temperature", self.ai.temperature),
            ("resource_temperature", self.ai.resource_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(HubError::Config(format!(
                    "ai.{} must be between 0.0 and 2.0, got {}",
                    name, value
                )));
            }
        }

        if self.ai.timeout_secs == 0 {
            return Err(HubError::Config(
                "ai.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.ai.max_output_tokens == 0
            || self.ai.chat_max_output_tokens == 0
            || self.ai.stream_max_output_tokens == 0
        {
            return Err(HubError::Config(
                "ai output token limits must be greater than 0".to_string(),
            ));
        }

        let base = url::Url::parse(&self.ai.api_base).map_err(|e| {
            HubError::Config(format!("ai.api_base '{}' is not a URL: {}", self.ai.api_base, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(HubError::Config(format!(
                "ai.api_base must use http or https, got '{}'",
                base.scheme()
            )));
        }

        for model in [
            &self.ai.model_smart,
            &self.ai.model_fast,
            &self.ai.model_resource,
        ] {
            if model.trim().is_empty() {
                return Err(HubError::Config("ai model ids must not be empty".to_string()));
            }
        }

        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(HubError::Config(
                "storage.path is required for the sqlite backend".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// AI Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// API key. Falls back to `GEMINI_API_KEY` when unset. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// REST endpoint base
    pub api_base: String,

    /// Model for drafting, task analysis and frame analysis
    pub model_smart: String,

    /// Model for chat and quick summaries
    pub model_fast: String,

    /// Model for grounded resource analysis
    pub model_resource: String,

    /// Default temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Temperature for resource analysis
    pub resource_temperature: f32,

    /// Output token cap for single-shot completions
    pub max_output_tokens: u32,

    /// Output token cap for task chat
    pub chat_max_output_tokens: u32,

    /// Output token cap for the streaming assistant
    pub stream_max_output_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Enable Google Search grounding for resource analysis
    pub grounding: bool,

    /// Per-category safety thresholds
    pub safety: Vec<SafetySetting>,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model_smart", &self.model_smart)
            .field("model_fast", &self.model_fast)
            .field("model_resource", &self.model_resource)
            .field("temperature", &self.temperature)
            .field("resource_temperature", &self.resource_temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("grounding", &self.grounding)
            .finish_non_exhaustive()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: ai::DEFAULT_API_BASE.to_string(),
            model_smart: ai::DEFAULT_MODEL_SMART.to_string(),
            model_fast: ai::DEFAULT_MODEL_FAST.to_string(),
            model_resource: ai::DEFAULT_MODEL_RESOURCE.to_string(),
            temperature: ai::DEFAULT_TEMPERATURE,
            resource_temperature: ai::RESOURCE_TEMPERATURE,
            max_output_tokens: ai::DEFAULT_MAX_OUTPUT_TOKENS,
            chat_max_output_tokens: ai::CHAT_MAX_OUTPUT_TOKENS,
            stream_max_output_tokens: ai::STREAM_MAX_OUTPUT_TOKENS,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            grounding: true,
            safety: SafetySetting::defaults(),
        }
    }
}

/// Harm category threshold sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    pub fn defaults() -> Vec<SafetySetting> {
        ai::HARM_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: category.to_string(),
                threshold: ai::DEFAULT_SAFETY_THRESHOLD.to_string(),
            })
            .collect()
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local store, lost on exit
    Memory,
    #[default]
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            _ => Err(format!(
                "Unknown storage backend: {}. Valid values: memory, sqlite",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// SQLite database file
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: Some(PathBuf::from(".nexushub/nexushub.db")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ai.safety.len(), 4);
        assert!(config.ai.safety.iter().all(|s| s.threshold == "BLOCK_NONE"));
    }

    #[test]
    fn test_validate_rejects_temperature() {
        let mut config = Config::default();
        config.ai.temperature = 3.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.ai.api_base = "not a url".into();
        assert!(config.validate().is_err());

        config.ai.api_base = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let mut config = Config::default();
        config.storage.path = None;
        assert!(config.validate().is_err());

        config.storage.backend = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_is_redacted_and_not_serialized() {
        let mut config = Config::default();
        config.ai.api_key = Some("AIza-secret".into());

        let debug = format!("{:?}", config.ai);
        assert!(!debug.contains("AIza-secret"));
        assert!(debug.contains("[REDACTED]"));

        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("AIza-secret"));
    }
}
