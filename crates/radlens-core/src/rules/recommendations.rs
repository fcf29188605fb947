//! Recommendation Generator
//!
//! Builds the next-step list, in this order:
//! 1. Discrepancy review, when any discrepancy was detected
//! 2. Upstream recommendations, or the baseline pair when there are none
//! 3. Urgent review, for high risk
//! 4. Additional correlation, when confidence is below 60
//!
//! Exact duplicates are removed before truncating to five entries.

use crate::types::{Discrepancy, RiskLevel};

pub const DISCREPANCY_REVIEW: &str =
    "Manual radiologist review recommended due to detected discrepancies.";
pub const CLINICAL_CORRELATION: &str = "Clinical correlation recommended.";
pub const FOLLOW_UP: &str = "Follow-up as clinically indicated.";
pub const URGENT_REVIEW: &str = "Urgent clinical review recommended.";
pub const ADDITIONAL_CORRELATION: &str = "Consider additional clinical correlation.";

pub const LOW_CONFIDENCE_THRESHOLD: f64 = 60.0;
pub const MAX_RECOMMENDATIONS: usize = 5;

pub struct RecommendationGenerator;

impl RecommendationGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate between one and five distinct recommendations.
    ///
    /// `upstream` holds recommendations already extracted from an upstream
    /// narrative; blank entries are ignored.
    pub fn generate(
        &self,
        risk: RiskLevel,
        discrepancies: &[Discrepancy],
        confidence: f64,
        upstream: &[String],
    ) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();

        if !discrepancies.is_empty() {
            candidates.push(DISCREPANCY_REVIEW.to_string());
        }

        let extracted: Vec<String> = upstream
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        if extracted.is_empty() {
            candidates.push(CLINICAL_CORRELATION.to_string());
            candidates.push(FOLLOW_UP.to_string());
        } else {
            candidates.extend(extracted);
        }

        if risk == RiskLevel::High {
            candidates.push(URGENT_REVIEW.to_string());
        }

        if confidence < LOW_CONFIDENCE_THRESHOLD {
            candidates.push(ADDITIONAL_CORRELATION.to_string());
        }

        let mut recommendations: Vec<String> = Vec::with_capacity(MAX_RECOMMENDATIONS);
        for candidate in candidates {
            if !recommendations.contains(&candidate) {
                recommendations.push(candidate);
            }
        }
        recommendations.truncate(MAX_RECOMMENDATIONS);

        recommendations
    }
}

impl Default for RecommendationGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscrepancyKind, Severity};
    use proptest::prelude::*;

    fn discrepancy() -> Discrepancy {
        Discrepancy::new(DiscrepancyKind::Inconsistency, "x", Severity::Medium, 75.0)
    }

    #[test]
    fn test_baseline_pair() {
        let recs = RecommendationGenerator::new().generate(RiskLevel::Low, &[], 80.0, &[]);
        assert_eq!(recs, vec![CLINICAL_CORRELATION, FOLLOW_UP]);
    }

    #[test]
    fn test_discrepancy_review_first() {
        let recs =
            RecommendationGenerator::new().generate(RiskLevel::Medium, &[discrepancy()], 65.0, &[]);
        assert_eq!(recs[0], DISCREPANCY_REVIEW);
        assert_eq!(recs.len(), 3);
    }

    #[test]
    fn test_low_confidence_appends_correlation() {
        let recs = RecommendationGenerator::new().generate(RiskLevel::Low, &[], 55.0, &[]);
        assert_eq!(recs.last().map(String::as_str), Some(ADDITIONAL_CORRELATION));
    }

    #[test]
    fn test_upstream_replaces_baseline() {
        let upstream = vec![
            "Repeat chest radiograph in 6 weeks".to_string(),
            "  ".to_string(),
        ];
        let recs = RecommendationGenerator::new().generate(RiskLevel::High, &[], 80.0, &upstream);
        assert_eq!(recs, vec!["Repeat chest radiograph in 6 weeks", URGENT_REVIEW]);
    }

    #[test]
    fn test_dedup_then_truncate() {
        let upstream: Vec<String> = vec![
            "A", "B", "A", "C", "D", "E", "F",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let recs =
            RecommendationGenerator::new().generate(RiskLevel::High, &[discrepancy()], 40.0, &upstream);

        assert_eq!(recs, vec![DISCREPANCY_REVIEW, "A", "B", "C", "D"]);
    }

    proptest! {
        #[test]
        fn prop_bounded_and_distinct(
            risk in prop::sample::select(vec![RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]),
            with_discrepancy: bool,
            confidence in 30.0f64..=95.0,
            upstream in prop::collection::vec("[a-c ]{0,3}", 0..8),
        ) {
            let discrepancies = if with_discrepancy { vec![discrepancy()] } else { vec![] };
            let recs = RecommendationGenerator::new().generate(risk, &discrepancies, confidence, &upstream);

            prop_assert!(!recs.is_empty());
            prop_assert!(recs.len() <= MAX_RECOMMENDATIONS);
            for (i, rec) in recs.iter().enumerate() {
                prop_assert!(!recs[i + 1..].contains(rec));
            }
        }
    }
}
