//! Rule stages of the analysis pipeline.
//!
//! Each stage is a unit struct with a single pure entry point and no
//! shared state, so stages can be constructed freely and evaluated in any
//! thread.
//!
//! | Stage | Entry point | Output |
//! |-------|-------------|--------|
//! | Content Validator | [`ContentValidator::validate`] | accept / reject |
//! | Finding Extractor | [`FindingExtractor::extract`] | up to 10 findings |
//! | Risk Classifier | [`RiskClassifier::classify`] | low / medium / high |
//! | Confidence Scorer | [`ConfidenceScorer::score`] | 30 to 95 |
//! | Discrepancy Detector | [`DiscrepancyDetector::detect`] | discrepancies |
//! | Recommendation Generator | [`RecommendationGenerator::generate`] | 1 to 5 lines |
//! | Quality Assessor | [`ReportQualityAssessor::assess`] | quality scores |

pub mod confidence;
pub mod discrepancy;
pub mod extractor;
pub mod patterns;
pub mod quality;
pub mod recommendations;
pub mod risk;
pub mod validator;

pub use confidence::ConfidenceScorer;
pub use discrepancy::DiscrepancyDetector;
pub use extractor::{ExtractionMode, FindingExtractor};
pub use quality::{QualityGrade, ReportQuality, ReportQualityAssessor, ReportSection};
pub use recommendations::RecommendationGenerator;
pub use risk::RiskClassifier;
pub use validator::ContentValidator;
