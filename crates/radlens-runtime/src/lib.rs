//! # radlens-runtime
//!
//! Async runtime around the deterministic `radlens-core` engine.
//!
//! This crate adds the parts of an analysis that talk to the outside world:
//! - Image classification behind [`ImageClassifier`]
//! - One narrative generation call behind [`TextGenerator`]
//! - Deadlines, retries, circuit breaking and fallback around both
//!
//! ## Important
//!
//! This crate is OPTIONAL. `radlens-core` analyzes report text on its own
//! and never makes network calls. When an upstream step fails here the
//! caller still receives a well-formed result, marked as fallback or
//! degraded depending on the configured strategy.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use radlens_runtime::{AnalysisOrchestrator, AnalysisRequest, RuntimeConfig};
//!
//! let orchestrator = AnalysisOrchestrator::builder()
//!     .generator(Arc::new(generator))
//!     .config(RuntimeConfig::from_file("radlens.yaml")?)
//!     .build()?;
//!
//! let report = orchestrator
//!     .analyze(AnalysisRequest::new(report_text, StudyType::ChestXray))
//!     .await?;
//! ```

pub mod config;
pub mod directory;
pub mod imaging;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;

pub use config::{CompletionSettings, ConfigError, RuntimeConfig};
pub use directory::{Role, StaticUserDirectory, User, UserDirectory};
pub use imaging::{
    ImageClassification, ImageClassifier, ImageUpload, LookupTableClassifier, UploadError,
    UploadLimits,
};
pub use orchestrator::{
    AnalysisOrchestrator, AnalysisOrchestratorBuilder, AnalysisReport, AnalysisRequest,
    RuntimeError, UpstreamError,
};
pub use providers::{
    ApiKey, Generation, GenerationRequest, GeneratorFactory, GeneratorRegistry, KeySource,
    ProviderError, TextGenerator, TokenUsage,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, FallbackStrategy, RetryPolicy, Upstream};
