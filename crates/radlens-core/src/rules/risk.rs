//! Risk Classifier
//!
//! **Question**: How urgent does the analysis narrative sound?
//!
//! | Level | Condition |
//! |-------|-----------|
//! | **High** | Any high-risk keyword (checked first, short-circuits) |
//! | **Medium** | Any medium-risk keyword |
//! | **Low** | Neither |

use crate::types::RiskLevel;

use super::patterns::{contains_any, HIGH_RISK_KEYWORDS, MEDIUM_RISK_KEYWORDS};

pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> RiskLevel {
        let lower = text.to_lowercase();

        if contains_any(&lower, HIGH_RISK_KEYWORDS) {
            RiskLevel::High
        } else if contains_any(&lower, MEDIUM_RISK_KEYWORDS) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_high_risk() {
        let classifier = RiskClassifier::new();
        assert_eq!(
            classifier.classify("urgent follow-up needed for acute finding"),
            RiskLevel::High
        );
        assert_eq!(classifier.classify("SEVERE stenosis"), RiskLevel::High);
    }

    #[test]
    fn test_medium_risk() {
        let classifier = RiskClassifier::new();
        assert_eq!(
            classifier.classify("Possible early pneumonia."),
            RiskLevel::Medium
        );
        assert_eq!(
            classifier.classify("Recommend follow-up imaging"),
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_low_risk() {
        let classifier = RiskClassifier::new();
        assert_eq!(
            classifier.classify("Lungs are clear. Heart size normal."),
            RiskLevel::Low
        );
    }

    proptest! {
        #[test]
        fn prop_high_keyword_always_wins(
            prefix in "[a-z ]{0,30}",
            high in prop::sample::select(HIGH_RISK_KEYWORDS),
            medium in prop::sample::select(MEDIUM_RISK_KEYWORDS),
            suffix in "[a-z ]{0,30}",
        ) {
            let text = format!("{} {} {} {}", prefix, medium, high, suffix);
            prop_assert_eq!(RiskClassifier::new().classify(&text), RiskLevel::High);
        }
    }
}
