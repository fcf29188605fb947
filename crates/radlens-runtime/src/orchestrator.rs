//! Async orchestration around the deterministic engine.
//!
//! The orchestrator adds the two upstream steps the core engine never
//! performs itself:
//! - Per-image classification, fanned out with a bounded worker count
//! - One narrative generation call, retried and bounded by a deadline
//!
//! Any upstream failure (error, timeout, open circuit, malformed
//! response) is absorbed into a fallback result. Only caller errors
//! (validation, upload limits) surface as `Err`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use radlens_core::{
    AnalysisInput, AnalysisResult, AnalysisStage, ContentValidator, Narrative, ResultAggregator,
    StudyType, ValidationError,
};

use crate::config::{ConfigError, RuntimeConfig};
use crate::imaging::{
    ImageClassification, ImageClassifier, ImageUpload, LookupTableClassifier, UploadError,
    UploadLimits,
};
use crate::prompts;
use crate::providers::{Generation, ProviderError, TextGenerator, TokenUsage};
use crate::resilience::{CircuitBreaker, Upstream};

/// Caller errors. Upstream failures never appear here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Why an upstream step was abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("{upstream} timed out after {elapsed:?}")]
    Timeout { upstream: Upstream, elapsed: Duration },

    #[error("{upstream} returned a malformed response: {reason}")]
    Malformed { upstream: Upstream, reason: String },

    #[error("{upstream} failed: {source}")]
    Provider {
        upstream: Upstream,
        source: ProviderError,
    },

    #[error("Circuit open for {0}, call skipped")]
    CircuitOpen(Upstream),
}

impl UpstreamError {
    /// Stage the fallback result is attributed to.
    pub fn stage(&self) -> AnalysisStage {
        let upstream = match self {
            UpstreamError::Timeout { upstream, .. }
            | UpstreamError::Malformed { upstream, .. }
            | UpstreamError::Provider { upstream, .. }
            | UpstreamError::CircuitOpen(upstream) => upstream,
        };
        match upstream {
            Upstream::TextGeneration => AnalysisStage::Generating,
            Upstream::ImageClassification => AnalysisStage::ClassifyingImages,
        }
    }
}

/// One analysis request, possibly carrying raw images.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub report_text: String,
    pub study_type: StudyType,
    pub patient_id: Option<String>,
    /// Findings already known, e.g. from an earlier classification
    pub image_findings: Vec<String>,
    pub image_confidences: Vec<f64>,
    /// Images to classify before analysis
    pub images: Vec<ImageUpload>,
}

impl AnalysisRequest {
    pub fn new(report_text: impl Into<String>, study_type: StudyType) -> Self {
        Self {
            report_text: report_text.into(),
            study_type,
            patient_id: None,
            image_findings: Vec::new(),
            image_confidences: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.images.push(image);
        self
    }

    fn input(
        &self,
        classified: &[ImageClassification],
    ) -> Result<AnalysisInput, ValidationError> {
        let mut builder = AnalysisInput::builder(self.report_text.clone(), self.study_type)
            .image_findings(self.image_findings.clone())
            .image_confidences(self.image_confidences.clone());
        if let Some(patient_id) = &self.patient_id {
            builder = builder.patient_id(patient_id.clone());
        }
        for classification in classified {
            builder = builder.image(classification.findings.clone(), classification.confidence);
        }
        builder.build()
    }
}

impl From<AnalysisInput> for AnalysisRequest {
    fn from(input: AnalysisInput) -> Self {
        Self {
            report_text: input.report_text().to_string(),
            study_type: input.study_type(),
            patient_id: input.patient_id().map(str::to_string),
            image_findings: input.image_findings().to_vec(),
            image_confidences: input.image_confidences().to_vec(),
            images: Vec::new(),
        }
    }
}

/// An analysis result plus run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,

    pub study_type: StudyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    pub analyzed_at: DateTime<Utc>,

    pub elapsed_ms: u64,

    /// Text generator name, when one was consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,

    /// Images with a confidence score, supplied or classified
    pub image_count: usize,
}

/// Runs one analysis end to end.
///
/// # Execution Flow
/// 1. Upload limits and content validation (caller errors)
/// 2. Image classification, bounded concurrency, order preserved
/// 3. Narrative generation, when a generator is configured
/// 4. Deterministic rules over the narrative (or the report text)
///
/// Steps 2 and 3 share one [`CircuitBreaker`] keyed by [`Upstream`].
pub struct AnalysisOrchestrator {
    generator: Option<Arc<dyn TextGenerator>>,
    classifier: Arc<dyn ImageClassifier>,
    config: RuntimeConfig,
    limits: UploadLimits,
    circuit_breaker: CircuitBreaker,
    validator: ContentValidator,
    aggregator: ResultAggregator,
}

impl AnalysisOrchestrator {
    pub fn builder() -> AnalysisOrchestratorBuilder {
        AnalysisOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisReport, RuntimeError> {
        let started = Instant::now();
        let analyzed_at = Utc::now();

        tracing::debug!(stage = %AnalysisStage::Validating, "Validating request");
        self.limits.check(&request.images)?;
        self.validator.check(&request.report_text)?;
        let base = request.input(&[])?;

        let mut generator_name = None;
        let mut usage = None;

        let (result, image_count) = match self
            .classify_images(&request.images, request.study_type)
            .await
        {
            Err(e) => (self.fall_back(&base, &e), base.image_count()),
            Ok(classified) => {
                let input = request.input(&classified)?;
                let result = match &self.generator {
                    None => self.aggregator.aggregate(&input, Narrative::ReportText),
                    Some(generator) => {
                        generator_name = Some(generator.name().to_string());
                        match self.generate_narrative(generator.as_ref(), &input).await {
                            Ok(generation) => {
                                usage = Some(generation.usage);
                                self.aggregator
                                    .aggregate(&input, Narrative::Upstream(&generation.text))
                            }
                            Err(e) => self.fall_back(&input, &e),
                        }
                    }
                };
                (result, input.image_count())
            }
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            risk = %result.risk_level,
            confidence = result.confidence,
            fallback = result.is_fallback(),
            degraded = result.is_degraded(),
            elapsed_ms,
            "Analysis finished"
        );

        Ok(AnalysisReport {
            result,
            study_type: request.study_type,
            patient_id: request.patient_id,
            analyzed_at,
            elapsed_ms,
            generator: generator_name,
            usage,
            image_count,
        })
    }

    async fn classify_images(
        &self,
        images: &[ImageUpload],
        study_type: StudyType,
    ) -> Result<Vec<ImageClassification>, UpstreamError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let upstream = Upstream::ImageClassification;
        if !self.circuit_breaker.permits(upstream) {
            return Err(UpstreamError::CircuitOpen(upstream));
        }

        tracing::debug!(
            stage = %AnalysisStage::ClassifyingImages,
            images = images.len(),
            classifier = self.classifier.name(),
            "Classifying images"
        );

        let classifier = &self.classifier;
        let calls = stream::iter(images)
            .map(|image| classifier.classify(image, study_type))
            .buffered(self.config.max_image_workers)
            .collect::<Vec<_>>();

        let outcome = match tokio::time::timeout(self.config.upstream_timeout, calls).await {
            Ok(results) => results
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| UpstreamError::Provider { upstream, source })
                .and_then(|classified| check_classifications(images, classified)),
            Err(_) => Err(UpstreamError::Timeout {
                upstream,
                elapsed: self.config.upstream_timeout,
            }),
        };

        self.record(upstream, outcome.is_ok());
        outcome
    }

    async fn generate_narrative(
        &self,
        generator: &dyn TextGenerator,
        input: &AnalysisInput,
    ) -> Result<Generation, UpstreamError> {
        let upstream = Upstream::TextGeneration;
        if !self.circuit_breaker.permits(upstream) {
            return Err(UpstreamError::CircuitOpen(upstream));
        }

        let request =
            prompts::generation_request(input, &self.config.completion, self.config.upstream_timeout);

        tracing::debug!(
            stage = %AnalysisStage::Generating,
            generator = generator.name(),
            model = %request.model,
            "Requesting narrative"
        );

        let calls = self
            .config
            .retry
            .run("text_generation", || generator.generate(&request));

        let outcome = match tokio::time::timeout(self.config.upstream_timeout, calls).await {
            Ok(Ok(generation)) if generation.text.trim().is_empty() => {
                Err(UpstreamError::Malformed {
                    upstream,
                    reason: "empty narrative".to_string(),
                })
            }
            Ok(Ok(generation)) => Ok(generation),
            Ok(Err(source)) => Err(UpstreamError::Provider { upstream, source }),
            Err(_) => Err(UpstreamError::Timeout {
                upstream,
                elapsed: self.config.upstream_timeout,
            }),
        };

        self.record(upstream, outcome.is_ok());
        outcome
    }

    fn record(&self, upstream: Upstream, success: bool) {
        if success {
            self.circuit_breaker.record_success(upstream);
        } else {
            self.circuit_breaker.record_failure(upstream);
        }
    }

    fn fall_back(&self, input: &AnalysisInput, error: &UpstreamError) -> AnalysisResult {
        tracing::warn!(stage = %error.stage(), error = %error, "Upstream step failed, using fallback");
        self.config
            .fallback
            .apply(&self.aggregator, input, error.stage(), error.to_string())
    }
}

/// A classifier reply is only usable if every confidence is a 0-100 score.
fn check_classifications(
    images: &[ImageUpload],
    classified: Vec<ImageClassification>,
) -> Result<Vec<ImageClassification>, UpstreamError> {
    if let Some((image, classification)) = images
        .iter()
        .zip(&classified)
        .find(|(_, classification)| !(0.0..=100.0).contains(&classification.confidence))
    {
        return Err(UpstreamError::Malformed {
            upstream: Upstream::ImageClassification,
            reason: format!(
                "confidence {} for {} is outside 0-100",
                classification.confidence, image.name
            ),
        });
    }
    Ok(classified)
}

/// Builder for [`AnalysisOrchestrator`].
pub struct AnalysisOrchestratorBuilder {
    generator: Option<Arc<dyn TextGenerator>>,
    classifier: Arc<dyn ImageClassifier>,
    config: RuntimeConfig,
    limits: UploadLimits,
}

impl AnalysisOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            generator: None,
            classifier: Arc::new(LookupTableClassifier::new()),
            config: RuntimeConfig::default(),
            limits: UploadLimits::default(),
        }
    }

    /// Consult `generator` for the analysis narrative. Without one the
    /// report text itself is analyzed.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn ImageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> Result<AnalysisOrchestrator, ConfigError> {
        self.config.validate()?;

        Ok(AnalysisOrchestrator {
            generator: self.generator,
            classifier: self.classifier,
            circuit_breaker: CircuitBreaker::new(self.config.circuit_breaker.clone()),
            config: self.config,
            limits: self.limits,
            validator: ContentValidator::new(),
            aggregator: ResultAggregator::new(),
        })
    }
}

impl Default for AnalysisOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
