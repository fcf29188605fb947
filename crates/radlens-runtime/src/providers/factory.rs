//! Registry of text generator factories.
//!
//! Providers register a factory under a type name; the CLI and embedding
//! services create generators from a type name plus JSON configuration.
//!
//! ```ignore
//! let registry = GeneratorRegistry::with_defaults();
//! let generator = registry.create("anthropic", &config)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{ProviderError, TextGenerator};

/// Creates generators of one provider type from configuration.
pub trait GeneratorFactory: Send + Sync {
    /// Unique identifier, e.g. `"anthropic"`.
    fn provider_type(&self) -> &'static str;

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn TextGenerator>, ProviderError>;

    /// Validate configuration without creating a generator.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }

    fn description(&self) -> &'static str {
        "Text generation provider"
    }
}

/// Provider type name to factory.
#[derive(Default)]
pub struct GeneratorRegistry {
    factories: BTreeMap<String, Arc<dyn GeneratorFactory>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same type name.
    pub fn register(&mut self, factory: Arc<dyn GeneratorFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        self.factory(provider_type)?.create(config)
    }

    pub fn validate(&self, provider_type: &str, config: &JsonValue) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate_config(config)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    pub fn default_config(&self, provider_type: &str) -> Option<JsonValue> {
        self.factories
            .get(provider_type)
            .map(|f| f.default_config())
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn GeneratorFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }

    /// Registry with all compiled-in providers.
    #[cfg(feature = "anthropic")]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::AnthropicGeneratorFactory));
        registry
    }

    /// Registry with all compiled-in providers.
    #[cfg(not(feature = "anthropic"))]
    pub fn with_defaults() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Generation, GenerationRequest, TokenUsage};
    use async_trait::async_trait;

    struct EchoGenerator {
        name: String,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ProviderError> {
            Ok(Generation {
                text: request.prompt.clone(),
                model: request.model.clone(),
                usage: TokenUsage::default(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct EchoFactory;

    impl GeneratorFactory for EchoFactory {
        fn provider_type(&self) -> &'static str {
            "echo"
        }

        fn create(&self, config: &JsonValue) -> Result<Arc<dyn TextGenerator>, ProviderError> {
            let name = config["name"].as_str().unwrap_or("echo").to_string();
            Ok(Arc::new(EchoGenerator { name }))
        }

        fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
            if config.is_object() {
                Ok(())
            } else {
                Err(ProviderError::NotConfigured("config must be an object".to_string()))
            }
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Arc::new(EchoFactory));

        assert!(registry.has_provider("echo"));
        let generator = registry
            .create("echo", &serde_json::json!({"name": "echo-1"}))
            .unwrap();
        assert_eq!(generator.name(), "echo-1");
        assert_eq!(registry.default_config("echo"), Some(serde_json::json!({})));
    }

    #[test]
    fn test_unknown_provider() {
        let registry = GeneratorRegistry::new();
        match registry.create("unknown", &serde_json::json!({})) {
            Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains("Unknown provider type")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_validate() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Arc::new(EchoFactory));

        assert!(registry.validate("echo", &serde_json::json!({})).is_ok());
        assert!(registry.validate("echo", &serde_json::json!("nope")).is_err());
        assert!(registry.validate("unknown", &serde_json::json!({})).is_err());
    }
}
