//! Shared value types for radlens analysis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::finding::Finding;
use crate::rules::ReportQuality;

/// Imaging modality of the submitted study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyType {
    ChestXray,
    CtScan,
    Mri,
    Ultrasound,
    Mammography,
    Other,
}

impl StudyType {
    /// All study types, in display order.
    pub const ALL: [StudyType; 6] = [
        StudyType::ChestXray,
        StudyType::CtScan,
        StudyType::Mri,
        StudyType::Ultrasound,
        StudyType::Mammography,
        StudyType::Other,
    ];

    /// Wire name (kebab-case), e.g. `chest-xray`.
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::ChestXray => "chest-xray",
            StudyType::CtScan => "ct-scan",
            StudyType::Mri => "mri",
            StudyType::Ultrasound => "ultrasound",
            StudyType::Mammography => "mammography",
            StudyType::Other => "other",
        }
    }

    /// Human-readable label used in prompts and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            StudyType::ChestXray => "Chest X-Ray",
            StudyType::CtScan => "CT Scan",
            StudyType::Mri => "MRI",
            StudyType::Ultrasound => "Ultrasound",
            StudyType::Mammography => "Mammography",
            StudyType::Other => "Other",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        StudyType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown study type '{}', expected one of: {}",
                    s,
                    StudyType::ALL.map(|t| t.as_str()).join(", ")
                )
            })
    }
}

/// Coarse triage label derived from keyword presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

/// Severity of a detected discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Category of a cross-modal or internal mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Mentioned in the report, not supported by the images
    FalsePositive,
    /// Seen in the images, not mentioned in the report
    FalseNegative,
    /// Contradictory statements within the report itself
    Inconsistency,
}

/// A detected mismatch between text and image findings, or within the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub description: String,
    pub severity: Severity,
    /// 0-100
    pub confidence: f64,
}

impl Discrepancy {
    pub fn new(
        kind: DiscrepancyKind,
        description: impl Into<String>,
        severity: Severity,
        confidence: f64,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }
}

/// Pipeline stages. `Fallback` is reachable from any stage after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Pending,
    Validating,
    /// Waiting on the upstream text-generation call
    Generating,
    /// Waiting on per-image classification calls
    ClassifyingImages,
    Extracting,
    Scoring,
    Detecting,
    Recommending,
    Complete,
    Fallback,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalysisStage::Pending => "pending",
            AnalysisStage::Validating => "validating",
            AnalysisStage::Generating => "generating",
            AnalysisStage::ClassifyingImages => "classifying_images",
            AnalysisStage::Extracting => "extracting",
            AnalysisStage::Scoring => "scoring",
            AnalysisStage::Detecting => "detecting",
            AnalysisStage::Recommending => "recommending",
            AnalysisStage::Complete => "complete",
            AnalysisStage::Fallback => "fallback",
        })
    }
}

/// How a result was produced.
///
/// `Fallback` always carries the fixed fallback shape. `Degraded` is a full
/// rule-based analysis of the report text, produced because an upstream
/// step failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Provenance {
    Full,
    Fallback {
        /// Stage that failed
        stage: AnalysisStage,
        reason: String,
    },
    Degraded {
        /// Upstream stage that failed
        stage: AnalysisStage,
        reason: String,
    },
}

impl Provenance {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Provenance::Fallback { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Provenance::Degraded { .. })
    }
}

/// The terminal output of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub risk_level: RiskLevel,

    /// 0-100
    pub confidence: f64,

    /// Text-sourced findings, at most 10, first-seen order
    pub findings: Vec<String>,

    /// Image findings, passed through unchanged
    pub image_findings: Vec<String>,

    pub discrepancies: Vec<Discrepancy>,

    /// 1 to 5 entries, no duplicates
    pub recommendations: Vec<String>,

    pub summary: String,

    /// `None` when no images were supplied
    pub cross_modal_agreement: Option<f64>,

    /// Structural quality of the submitted report text
    pub quality: ReportQuality,

    pub provenance: Provenance,
}

impl AnalysisResult {
    /// All findings tagged with the modality they came from, text first.
    pub fn tagged_findings(&self) -> Vec<Finding> {
        self.findings
            .iter()
            .map(Finding::from_text)
            .chain(self.image_findings.iter().map(Finding::from_image))
            .collect()
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance.is_fallback()
    }

    pub fn is_degraded(&self) -> bool {
        self.provenance.is_degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_type_round_trips_wire_name() {
        for study_type in StudyType::ALL {
            assert_eq!(study_type.as_str().parse::<StudyType>(), Ok(study_type));
        }
        assert_eq!(" CT-Scan ".parse::<StudyType>(), Ok(StudyType::CtScan));
        assert!("pet".parse::<StudyType>().is_err());
    }

    #[test]
    fn test_study_type_serializes_kebab_case() {
        let json = serde_json::to_string(&StudyType::ChestXray).unwrap();
        assert_eq!(json, "\"chest-xray\"");
    }

    #[test]
    fn test_discrepancy_confidence_clamped() {
        let d = Discrepancy::new(DiscrepancyKind::Inconsistency, "x", Severity::Low, 140.0);
        assert_eq!(d.confidence, 100.0);
    }

    #[test]
    fn test_provenance_serialization() {
        let fallback = Provenance::Fallback {
            stage: AnalysisStage::Generating,
            reason: "timeout".to_string(),
        };
        let value = serde_json::to_value(&fallback).unwrap();
        assert_eq!(value["mode"], "fallback");
        assert_eq!(value["stage"], "generating");
        assert!(fallback.is_fallback());
        assert!(!Provenance::Full.is_fallback());

        let degraded = Provenance::Degraded {
            stage: AnalysisStage::Generating,
            reason: "timeout".to_string(),
        };
        assert_eq!(serde_json::to_value(&degraded).unwrap()["mode"], "degraded");
        assert!(degraded.is_degraded());
        assert!(!degraded.is_fallback());
    }
}
