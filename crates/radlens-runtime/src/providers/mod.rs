//! Text generation providers for radlens-runtime.
//!
//! A provider turns the analysis prompt into a free-text narrative which
//! the deterministic rules in `radlens-core` then parse. Providers are
//! unreliable by contract: every error here ends in a fallback result, never
//! in a caller-visible failure.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

pub use factory::{GeneratorFactory, GeneratorRegistry};
pub use secrets::{ApiKey, KeySource};

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicGenerator, AnthropicGeneratorFactory};

/// Errors from text generation providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Authentication failed")]
    Auth,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) | ProviderError::RateLimited { .. } | ProviderError::Timeout(_) => {
                true
            }
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Parse(_) | ProviderError::Auth | ProviderError::NotConfigured(_) => false,
        }
    }
}

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    /// 0.0 for deterministic sampling
    pub temperature: f32,
    /// Per-attempt HTTP timeout
    pub timeout: Duration,
}

/// Text returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub stop_reason: Option<String>,
}

/// Token usage from a generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Text generation backend.
///
/// This is the single outbound text call the engine makes. Implementations
/// must be safe to share across concurrent analyses.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a narrative for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ProviderError>;

    /// Check if the provider is usable.
    async fn health_check(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
