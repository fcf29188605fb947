//! # radlens-core
//!
//! Deterministic rule engine for radiology report analysis.
//!
//! Given report text and optional image findings, this crate answers:
//! - Does the text look like a medical report at all?
//! - Which findings does it state, and how risky do they sound?
//! - Do the report and the images agree with each other?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No network calls**: All analysis is keyword and pattern based
//! 3. **Always well-formed**: After validation, every failure degrades to a
//!    labelled fallback result instead of an error
//!
//! ## Example
//!
//! ```rust,ignore
//! use radlens_core::{analyze, AnalysisInput, StudyType};
//!
//! let input = AnalysisInput::builder(report_text, StudyType::ChestXray)
//!     .image_findings(vec!["Mild opacity in right lower lobe".into()])
//!     .build()?;
//! let result = analyze(&input)?;
//!
//! println!("{} risk, {}% confidence", result.risk_level, result.confidence);
//! ```

pub mod aggregator;
pub mod finding;
pub mod input;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use aggregator::{Narrative, ResultAggregator};
pub use finding::{Finding, FindingSeverity, FindingSource};
pub use input::{AnalysisInput, AnalysisInputBuilder, InputError};
pub use rules::{
    ConfidenceScorer, ContentValidator, DiscrepancyDetector, ExtractionMode, FindingExtractor,
    QualityGrade, RecommendationGenerator, ReportQuality, ReportQualityAssessor, ReportSection,
    RiskClassifier,
};
pub use types::{
    AnalysisResult, AnalysisStage, Discrepancy, DiscrepancyKind, Provenance, RiskLevel, Severity,
    StudyType,
};

use thiserror::Error;

/// Caller input that the engine refuses to analyze.
///
/// These are the only errors surfaced to callers of [`analyze`]; everything
/// that goes wrong later becomes a fallback result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Report text is empty")]
    EmptyReport,

    #[error("Report text is too short: {length} characters (must exceed {minimum})")]
    TooShort { length: usize, minimum: usize },

    #[error("Report text does not appear to be medical content")]
    NotMedicalContent,

    #[error("Image confidence at index {index} is out of range: {value} (expected 0-100)")]
    ConfidenceOutOfRange { index: usize, value: f64 },
}

/// Failure inside a rule stage. Always recovered by the aggregator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("No structured findings in upstream narrative")]
    NoStructuredFindings,

    #[error("Upstream narrative is empty")]
    EmptyNarrative,
}

impl RuleError {
    /// Stage the error is attributed to.
    pub fn stage(&self) -> AnalysisStage {
        match self {
            RuleError::NoStructuredFindings | RuleError::EmptyNarrative => {
                AnalysisStage::Extracting
            }
        }
    }
}

/// Analyze a report using its own text as the analysis narrative.
///
/// This is the main entry point for offline analysis.
///
/// # Errors
///
/// Returns a [`ValidationError`] only when the report fails the content
/// gate. Every later failure yields a fallback [`AnalysisResult`].
pub fn analyze(input: &AnalysisInput) -> Result<AnalysisResult, ValidationError> {
    ContentValidator::new().check(input.report_text())?;
    Ok(ResultAggregator::new().aggregate(input, Narrative::ReportText))
}

/// Analyze a report using a narrative produced by an upstream text
/// generator.
///
/// The narrative drives extraction, risk, confidence and recommendations;
/// discrepancy detection always compares the original report text against
/// the image findings.
pub fn analyze_narrative(
    input: &AnalysisInput,
    narrative: &str,
) -> Result<AnalysisResult, ValidationError> {
    ContentValidator::new().check(input.report_text())?;
    Ok(ResultAggregator::new().aggregate(input, Narrative::Upstream(narrative)))
}
