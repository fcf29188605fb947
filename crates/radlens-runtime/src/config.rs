//! Runtime configuration.
//!
//! Loaded from YAML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```yaml
//! upstream_timeout: 20s
//! max_image_workers: 4
//! completion:
//!   model: claude-sonnet-4-5
//!   max_tokens: 800
//!   temperature: 0.0
//! retry:
//!   max_attempts: 3
//!   min_delay: 500ms
//!   max_delay: 4s
//! circuit_breaker:
//!   failure_threshold: 3
//!   recovery_timeout: 30s
//!   success_threshold: 2
//! fallback:
//!   type: canned
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::{CircuitBreakerConfig, FallbackStrategy, RetryPolicy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings passed to the text generator on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    /// 0.0 for deterministic sampling
    pub temperature: f32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 800,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Deadline for each upstream stage (generation, image classification),
    /// retries included
    #[serde(with = "duration")]
    pub upstream_timeout: Duration,

    /// Images classified concurrently
    pub max_image_workers: usize,

    pub completion: CompletionSettings,

    pub retry: RetryPolicy,

    pub circuit_breaker: CircuitBreakerConfig,

    pub fallback: FallbackStrategy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_secs(20),
            max_image_workers: 4,
            completion: CompletionSettings::default(),
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            fallback: FallbackStrategy::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "upstream_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_image_workers == 0 {
            return Err(ConfigError::Invalid(
                "max_image_workers must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.min_delay > self.retry.max_delay {
            return Err(ConfigError::Invalid(
                "retry.min_delay must not exceed retry.max_delay".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 || self.circuit_breaker.success_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker thresholds must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.completion.temperature) {
            return Err(ConfigError::Invalid(
                "completion.temperature must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serde adapter for human-readable durations (`"250ms"`, `"30s"`).
pub(crate) mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(RuntimeConfig::from_yaml("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = RuntimeConfig::from_yaml(
            "upstream_timeout: 5s\nretry:\n  max_attempts: 1\nfallback:\n  type: report_text\n",
        )
        .unwrap();

        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.min_delay, Duration::from_millis(500));
        assert_eq!(config.fallback, FallbackStrategy::ReportText);
        assert_eq!(config.max_image_workers, 4);
    }

    #[test]
    fn test_duration_round_trip() {
        let config = RuntimeConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("upstream_timeout: 20s"));
        assert_eq!(RuntimeConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_bad_duration() {
        assert!(matches!(
            RuntimeConfig::from_yaml("upstream_timeout: soon"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            RuntimeConfig::from_yaml("max_image_workers: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_yaml("upstream_timeout: 0s"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_yaml("retry:\n  min_delay: 10s\n  max_delay: 1s\n"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
