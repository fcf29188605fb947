//! What to return when an upstream step fails.

use radlens_core::{AnalysisInput, AnalysisResult, AnalysisStage, ResultAggregator};
use serde::{Deserialize, Serialize};

/// Fallback strategy when the upstream narrative or image classification
/// cannot be obtained.
///
/// `Canned` results carry `Provenance::Fallback`. `ReportText` results are
/// real analyses and carry `Provenance::Degraded` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Fixed-shape result: medium risk, confidence 75, canned
    /// recommendations
    #[default]
    Canned,

    /// Run the deterministic rules over the report text itself
    ReportText,
}

impl FallbackStrategy {
    pub fn apply(
        &self,
        aggregator: &ResultAggregator,
        input: &AnalysisInput,
        stage: AnalysisStage,
        reason: impl Into<String>,
    ) -> AnalysisResult {
        match self {
            FallbackStrategy::Canned => aggregator.fallback(input, stage, reason),
            FallbackStrategy::ReportText => aggregator.degraded(input, stage, reason),
        }
    }
}
