//! Findings with provenance.
//!
//! A finding is a short natural-language statement about a clinical
//! observation, tagged with the modality it was derived from.
//!
//! Construction also reads clinical attributes off the statement:
//!
//! | Attribute | Source | Default |
//! |-----------|--------|---------|
//! | `location` | first anatomical location named | pathology's usual site |
//! | `severity` | first severity modifier (mild, large, acute, ...) | pathology's usual severity |
//! | `confidence` | hedging, definitive and negation cues | 80 |

use serde::{Deserialize, Serialize};

use crate::rules::patterns::{
    mentions_affirmatively, pathology, ANATOMICAL_LOCATION, DEFINITIVE_CUE, DESCRIPTIVE_CUE,
    HEDGING_CUE, PATHOLOGY_TERM, SEVERITY_MODIFIER,
};

const BASE_CONFIDENCE: f64 = 80.0;
const DESCRIPTIVE_BONUS: f64 = 10.0;
const HEDGING_PENALTY: f64 = 15.0;
const DEFINITIVE_BONUS: f64 = 15.0;
const NEGATION_PENALTY: f64 = 20.0;
const MIN_CONFIDENCE: f64 = 30.0;
const MAX_CONFIDENCE: f64 = 95.0;

/// Which modality a finding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    Text,
    Image,
}

/// How severe the observation is described as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Mild,
    Moderate,
    Severe,
}

/// A single finding statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub text: String,
    pub source: FindingSource,

    /// Anatomical location, e.g. "right lower lobe"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<FindingSeverity>,

    /// 30-95, from the wording of the statement
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    BASE_CONFIDENCE
}

impl Finding {
    /// Finding extracted from report or narrative text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(text.into(), FindingSource::Text)
    }

    /// Finding reported by an image classifier.
    pub fn from_image(text: impl Into<String>) -> Self {
        Self::new(text.into(), FindingSource::Image)
    }

    fn new(text: String, source: FindingSource) -> Self {
        let term = PATHOLOGY_TERM
            .find(&text)
            .map(|m| m.as_str().to_lowercase());
        let defaults = term.as_deref().and_then(pathology);

        let location = ANATOMICAL_LOCATION
            .find(&text)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
            .or_else(|| defaults.and_then(|p| p.location).map(str::to_string));

        let severity = severity_modifier(&text).or_else(|| defaults.map(|p| p.severity));
        let confidence = wording_confidence(&text, term.as_deref());

        Self {
            text,
            source,
            location,
            severity,
            confidence,
        }
    }

    pub fn is_text(&self) -> bool {
        self.source == FindingSource::Text
    }
}

fn severity_modifier(text: &str) -> Option<FindingSeverity> {
    let caps = SEVERITY_MODIFIER.captures(text)?;
    if caps.name("mild").is_some() {
        Some(FindingSeverity::Mild)
    } else if caps.name("moderate").is_some() {
        Some(FindingSeverity::Moderate)
    } else {
        Some(FindingSeverity::Severe)
    }
}

fn wording_confidence(text: &str, term: Option<&str>) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if DESCRIPTIVE_CUE.is_match(text) {
        confidence += DESCRIPTIVE_BONUS;
    }
    if HEDGING_CUE.is_match(text) {
        confidence -= HEDGING_PENALTY;
    }
    if DEFINITIVE_CUE.is_match(text) {
        confidence += DEFINITIVE_BONUS;
    }
    if let Some(term) = term {
        if !mentions_affirmatively(text, term) {
            confidence -= NEGATION_PENALTY;
        }
    }
    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_sources() {
        let text = Finding::from_text("Opacity noted in report");
        let image = Finding::from_image("Mild opacity in right lower lobe");

        assert!(text.is_text());
        assert_eq!(image.source, FindingSource::Image);
        assert!(!image.is_text());
    }

    #[test]
    fn test_finding_serializes_source_lowercase() {
        let value = serde_json::to_value(Finding::from_image("x")).unwrap();
        assert_eq!(value["source"], "image");
        assert!(value.get("location").is_none());
        assert_eq!(value["confidence"], 80.0);
    }

    #[test]
    fn test_location_and_mild_severity() {
        let finding = Finding::from_image("Mild opacity in Right Lower Lobe");

        assert_eq!(finding.location.as_deref(), Some("right lower lobe"));
        assert_eq!(finding.severity, Some(FindingSeverity::Mild));
        assert_eq!(finding.confidence, 80.0);
    }

    #[test]
    fn test_moderate_and_severe_modifiers() {
        let chronic = Finding::from_text("Chronic atelectasis at the left base");
        assert_eq!(chronic.severity, Some(FindingSeverity::Moderate));
        assert_eq!(chronic.location.as_deref(), Some("base"));

        let large = Finding::from_text("Large pleural effusion");
        assert_eq!(large.severity, Some(FindingSeverity::Severe));
        assert_eq!(large.location.as_deref(), Some("pleural"));

        // "massive" is a modifier, not the pathology "mass"
        let massive = Finding::from_text("Massive effusion");
        assert_eq!(massive.severity, Some(FindingSeverity::Severe));
        assert_eq!(massive.location.as_deref(), Some("pleural"));
    }

    #[test]
    fn test_pathology_defaults() {
        let finding = Finding::from_text("Pneumothorax noted in report");
        assert_eq!(finding.severity, Some(FindingSeverity::Severe));
        assert_eq!(finding.location.as_deref(), Some("pleural"));

        let lesion = Finding::from_text("Lesion noted in report");
        assert_eq!(lesion.severity, Some(FindingSeverity::Moderate));
        assert_eq!(lesion.location, None);

        let plain = Finding::from_text("Heart size within limits");
        assert_eq!(plain.location.as_deref(), Some("heart"));
        assert_eq!(plain.severity, None);
    }

    #[test]
    fn test_wording_confidence() {
        assert_eq!(Finding::from_text("Findings compatible with pneumonia").confidence, 90.0);
        assert_eq!(Finding::from_text("Possible early pneumonia").confidence, 65.0);
        assert_eq!(Finding::from_text("Definite rib fracture").confidence, 95.0);
        assert_eq!(Finding::from_text("No pneumothorax").confidence, 60.0);
        // 80 - 15 - 20
        assert_eq!(Finding::from_text("No likely effusion").confidence, 45.0);
    }
}
