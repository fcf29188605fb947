//! Result Aggregator: runs the rule stages and assembles the final result.
//!
//! | From | To | Trigger |
//! |------|----|---------|
//! | Extracting | Scoring | Findings extracted |
//! | Scoring | Detecting | Risk and confidence computed |
//! | Detecting | Recommending | Discrepancies computed |
//! | Recommending | Complete | Recommendations generated |
//! | Extracting / Scoring / Detecting | Fallback | Any [`RuleError`] |
//!
//! Validation happens before the aggregator is called. Once inside, the
//! caller always gets a well-formed [`AnalysisResult`].

use crate::input::AnalysisInput;
use crate::rules::{
    ConfidenceScorer, DiscrepancyDetector, ExtractionMode, FindingExtractor,
    RecommendationGenerator, ReportQualityAssessor, RiskClassifier,
};
use crate::types::{AnalysisResult, AnalysisStage, Provenance, RiskLevel};
use crate::RuleError;

/// Fixed confidence of a fallback result.
pub const FALLBACK_CONFIDENCE: f64 = 75.0;

pub const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Manual radiologist review required - automated analysis could not be completed.",
    "Clinical correlation recommended.",
    "Follow-up as clinically indicated.",
];

/// Text the narrative-driven stages (extraction, risk, confidence,
/// recommendations) run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrative<'a> {
    /// The submitted report itself, extracted in basic mode.
    ReportText,
    /// Output of an upstream text generator, extracted in structured mode.
    Upstream(&'a str),
}

/// The aggregator drives the pipeline and owns the fallback path.
pub struct ResultAggregator {
    extractor: FindingExtractor,
    risk: RiskClassifier,
    scorer: ConfidenceScorer,
    detector: DiscrepancyDetector,
    recommender: RecommendationGenerator,
    quality: ReportQualityAssessor,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            extractor: FindingExtractor::new(),
            risk: RiskClassifier::new(),
            scorer: ConfidenceScorer::new(),
            detector: DiscrepancyDetector::new(),
            recommender: RecommendationGenerator::new(),
            quality: ReportQualityAssessor::new(),
        }
    }

    /// Run every stage over `input`, substituting the fallback result if a
    /// stage fails.
    pub fn aggregate(&self, input: &AnalysisInput, narrative: Narrative<'_>) -> AnalysisResult {
        match self.run(input, narrative) {
            Ok(result) => {
                tracing::debug!(
                    stage = %AnalysisStage::Complete,
                    risk = %result.risk_level,
                    confidence = result.confidence,
                    "Analysis complete"
                );
                result
            }
            Err(e) => {
                tracing::warn!(stage = %e.stage(), error = %e, "Rule stage failed, using fallback");
                self.fallback(input, e.stage(), e.to_string())
            }
        }
    }

    /// The fixed-shape fallback result.
    ///
    /// Medium risk, confidence 75, basic-mode findings from the report, no
    /// discrepancies and the three canned recommendations.
    pub fn fallback(
        &self,
        input: &AnalysisInput,
        stage: AnalysisStage,
        reason: impl Into<String>,
    ) -> AnalysisResult {
        let findings = self
            .extractor
            .extract(input.report_text(), ExtractionMode::Basic);

        let summary = format!(
            "Automated analysis incomplete ({}). {} finding(s) extracted from report text. Manual review required.",
            stage,
            findings.len()
        );

        AnalysisResult {
            risk_level: RiskLevel::Medium,
            confidence: FALLBACK_CONFIDENCE,
            findings,
            image_findings: input.image_findings().to_vec(),
            discrepancies: Vec::new(),
            recommendations: FALLBACK_RECOMMENDATIONS.map(String::from).to_vec(),
            summary,
            cross_modal_agreement: None,
            quality: self.quality.assess(input.report_text()),
            provenance: Provenance::Fallback {
                stage,
                reason: reason.into(),
            },
        }
    }

    /// Full deterministic analysis of the report text, labelled as
    /// degraded by the failure of `stage`.
    ///
    /// Used when an upstream step failed but the report itself is still
    /// worth analyzing. If the rules fail too, the result is the plain
    /// fallback.
    pub fn degraded(
        &self,
        input: &AnalysisInput,
        stage: AnalysisStage,
        reason: impl Into<String>,
    ) -> AnalysisResult {
        let mut result = self.aggregate(input, Narrative::ReportText);
        if !result.is_fallback() {
            result.provenance = Provenance::Degraded {
                stage,
                reason: reason.into(),
            };
        }
        result
    }

    fn run(
        &self,
        input: &AnalysisInput,
        narrative: Narrative<'_>,
    ) -> Result<AnalysisResult, RuleError> {
        let report = input.report_text();

        tracing::debug!(stage = %AnalysisStage::Extracting, "Extracting findings");
        let (text, findings, upstream_recommendations) = match narrative {
            Narrative::ReportText => {
                let findings = self.extractor.extract(report, ExtractionMode::Basic);
                (report, findings, Vec::new())
            }
            Narrative::Upstream(text) => {
                if text.trim().is_empty() {
                    return Err(RuleError::EmptyNarrative);
                }
                let findings = self.extractor.extract(text, ExtractionMode::Structured);
                if findings.is_empty() {
                    return Err(RuleError::NoStructuredFindings);
                }
                (text, findings, self.extractor.recommendation_items(text))
            }
        };

        tracing::debug!(stage = %AnalysisStage::Scoring, findings = findings.len(), "Scoring");
        let risk_level = self.risk.classify(text);
        let confidence = self.scorer.score(text, input.has_images());

        tracing::debug!(stage = %AnalysisStage::Detecting, "Detecting discrepancies");
        let discrepancies = self.detector.detect(report, input.image_findings());
        let cross_modal_agreement = input
            .has_images()
            .then(|| self.detector.agreement(report, input.image_findings()));

        tracing::debug!(stage = %AnalysisStage::Recommending, "Generating recommendations");
        let recommendations = self.recommender.generate(
            risk_level,
            &discrepancies,
            confidence,
            &upstream_recommendations,
        );

        let summary = build_summary(
            risk_level,
            confidence,
            findings.len(),
            input,
            discrepancies.len(),
            cross_modal_agreement,
        );

        Ok(AnalysisResult {
            risk_level,
            confidence,
            findings,
            image_findings: input.image_findings().to_vec(),
            discrepancies,
            recommendations,
            summary,
            cross_modal_agreement,
            quality: self.quality.assess(report),
            provenance: Provenance::Full,
        })
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn build_summary(
    risk: RiskLevel,
    confidence: f64,
    finding_count: usize,
    input: &AnalysisInput,
    discrepancy_count: usize,
    agreement: Option<f64>,
) -> String {
    let mut parts = vec![
        format!(
            "{} risk assessment with {:.0}% confidence",
            risk.label(),
            confidence
        ),
        format!("{} finding(s) extracted from report", finding_count),
    ];

    match agreement {
        Some(agreement) => parts.push(format!(
            "{} image finding(s) reviewed with {:.1}% cross-modal agreement",
            input.image_findings().len(),
            agreement
        )),
        None => parts.push("No images provided - text-only analysis performed".to_string()),
    }

    if discrepancy_count == 0 {
        parts.push("No discrepancies detected".to_string());
    } else {
        parts.push(format!("{} discrepancy(ies) detected", discrepancy_count));
    }

    format!("{}.", parts.join(". "))
}
