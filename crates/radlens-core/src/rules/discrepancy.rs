//! Cross-Modal Discrepancy Detector
//!
//! **Question**: Do the report text and the image findings tell the same
//! story?
//!
//! Rules are evaluated independently, in this order:
//!
//! | Kind | Fires when | Severity | Confidence |
//! |------|------------|----------|------------|
//! | **Inconsistency** | Report says both "normal" and "abnormal" | medium | 75 |
//! | **False positive** | Report asserts a term no image finding supports | medium | 70 |
//! | **False negative** | An image finding reports a term the report never mentions | high | 80 |
//!
//! Both cross-modal rules only run when image findings are present. A term
//! only counts when it is not negated earlier in the same clause, so
//! "no opacity noted" does not support a pneumonia claim.

use crate::types::{Discrepancy, DiscrepancyKind, Severity};

use super::patterns::{capitalize, mentions_affirmatively, ABNORMAL_WORD, NORMAL_WORD};

pub const INCONSISTENCY_DESCRIPTION: &str =
    "Report contains both normal and abnormal findings - review for clarity";

const INCONSISTENCY_CONFIDENCE: f64 = 75.0;
const FALSE_POSITIVE_CONFIDENCE: f64 = 70.0;
const FALSE_NEGATIVE_CONFIDENCE: f64 = 80.0;

/// A report term and the image terms that would corroborate it.
struct SupportRule {
    term: &'static str,
    label: &'static str,
    image_terms: &'static [&'static str],
}

/// An image-observable term and the report terms that would account for it.
struct ObservationRule {
    term: &'static str,
    report_terms: &'static [&'static str],
}

const SUPPORT_RULES: &[SupportRule] = &[
    SupportRule {
        term: "pneumonia",
        label: "opacity",
        image_terms: &["opacity"],
    },
    SupportRule {
        term: "infiltrate",
        label: "opacity",
        image_terms: &["infiltrate", "opacity"],
    },
    SupportRule {
        term: "consolidation",
        label: "opacity",
        image_terms: &["consolidation", "opacity"],
    },
    SupportRule {
        term: "effusion",
        label: "fluid collection",
        image_terms: &["effusion", "fluid"],
    },
    SupportRule {
        term: "pneumothorax",
        label: "pleural air",
        image_terms: &["pneumothorax"],
    },
    SupportRule {
        term: "fracture",
        label: "cortical disruption",
        image_terms: &["fracture"],
    },
    SupportRule {
        term: "nodule",
        label: "nodular density",
        image_terms: &["nodule", "mass"],
    },
];

const OBSERVATION_RULES: &[ObservationRule] = &[
    ObservationRule {
        term: "opacity",
        report_terms: &["opacity", "pneumonia", "consolidation", "infiltrate", "atelectasis"],
    },
    ObservationRule {
        term: "consolidation",
        report_terms: &["consolidation", "pneumonia", "opacity"],
    },
    ObservationRule {
        term: "effusion",
        report_terms: &["effusion", "fluid"],
    },
    ObservationRule {
        term: "pneumothorax",
        report_terms: &["pneumothorax"],
    },
    ObservationRule {
        term: "fracture",
        report_terms: &["fracture"],
    },
    ObservationRule {
        term: "nodule",
        report_terms: &["nodule", "mass", "lesion"],
    },
    ObservationRule {
        term: "mass",
        report_terms: &["mass", "nodule", "lesion"],
    },
];

pub struct DiscrepancyDetector;

impl DiscrepancyDetector {
    pub fn new() -> Self {
        Self
    }

    /// Compare `report` against `image_findings`.
    pub fn detect(&self, report: &str, image_findings: &[String]) -> Vec<Discrepancy> {
        let mut discrepancies = Vec::new();

        if NORMAL_WORD.is_match(report) && ABNORMAL_WORD.is_match(report) {
            discrepancies.push(Discrepancy::new(
                DiscrepancyKind::Inconsistency,
                INCONSISTENCY_DESCRIPTION,
                Severity::Medium,
                INCONSISTENCY_CONFIDENCE,
            ));
        }

        if image_findings.is_empty() {
            return discrepancies;
        }

        for rule in SUPPORT_RULES {
            if mentions_affirmatively(report, rule.term)
                && !images_affirm_any(image_findings, rule.image_terms)
            {
                discrepancies.push(Discrepancy::new(
                    DiscrepancyKind::FalsePositive,
                    format!(
                        "{} mentioned in report but corresponding {} not clearly visible in images",
                        capitalize(rule.term),
                        rule.label
                    ),
                    Severity::Medium,
                    FALSE_POSITIVE_CONFIDENCE,
                ));
            }
        }

        for rule in OBSERVATION_RULES {
            if images_affirm_any(image_findings, &[rule.term])
                && !rule
                    .report_terms
                    .iter()
                    .any(|term| mentions_affirmatively(report, term))
            {
                discrepancies.push(Discrepancy::new(
                    DiscrepancyKind::FalseNegative,
                    format!(
                        "{} detected in images but not mentioned in report",
                        capitalize(rule.term)
                    ),
                    Severity::High,
                    FALSE_NEGATIVE_CONFIDENCE,
                ));
            }
        }

        tracing::debug!(
            count = discrepancies.len(),
            images = image_findings.len(),
            "Discrepancy detection complete"
        );

        discrepancies
    }

    /// Percentage agreement between report claims and image observations.
    ///
    /// `2 * agreements / (mentioned + observed) * 100`, capped at 100 and
    /// rounded to one decimal. 100 when neither side asserts anything.
    pub fn agreement(&self, report: &str, image_findings: &[String]) -> f64 {
        let mentioned: Vec<&SupportRule> = SUPPORT_RULES
            .iter()
            .filter(|rule| mentions_affirmatively(report, rule.term))
            .collect();

        let observed = OBSERVATION_RULES
            .iter()
            .filter(|rule| images_affirm_any(image_findings, &[rule.term]))
            .count();

        let agreements = mentioned
            .iter()
            .filter(|rule| images_affirm_any(image_findings, rule.image_terms))
            .count();

        let total = mentioned.len() + observed;
        if total == 0 {
            return 100.0;
        }

        let ratio = (2.0 * agreements as f64 / total as f64 * 100.0).min(100.0);
        (ratio * 10.0).round() / 10.0
    }
}

impl Default for DiscrepancyDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn images_affirm_any(image_findings: &[String], terms: &[&str]) -> bool {
    image_findings
        .iter()
        .any(|finding| terms.iter().any(|term| mentions_affirmatively(finding, term)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_inconsistency() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "Normal heart size. Abnormal lung opacity in the right lower lobe.",
            &[],
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, DiscrepancyKind::Inconsistency);
        assert_eq!(result[0].severity, Severity::Medium);
        assert_eq!(result[0].confidence, 75.0);
        assert_eq!(result[0].description, INCONSISTENCY_DESCRIPTION);
    }

    #[test]
    fn test_abnormal_alone_is_not_inconsistent() {
        let detector = DiscrepancyDetector::new();
        assert!(detector.detect("Abnormal opacity at the base.", &[]).is_empty());
    }

    #[test]
    fn test_pneumonia_without_opacity() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "Findings compatible with pneumonia.",
            &images(&["clear lung fields", "no opacity noted"]),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, DiscrepancyKind::FalsePositive);
        assert_eq!(result[0].severity, Severity::Medium);
        assert_eq!(result[0].confidence, 70.0);
    }

    #[test]
    fn test_pneumonia_needs_image_opacity() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "Findings compatible with pneumonia.",
            &images(&["Dense consolidation in the left base"]),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, DiscrepancyKind::FalsePositive);
        assert_eq!(
            result[0].description,
            "Pneumonia mentioned in report but corresponding opacity not clearly visible in images"
        );
    }

    #[test]
    fn test_infiltrate_has_its_own_pairing() {
        let detector = DiscrepancyDetector::new();
        assert!(detector
            .detect(
                "Patchy infiltrate in the left base.",
                &images(&["Patchy infiltrate in the left base"]),
            )
            .is_empty());

        let result = detector.detect(
            "Patchy infiltrate in the left base.",
            &images(&["Clear lung fields"]),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].description,
            "Infiltrate mentioned in report but corresponding opacity not clearly visible in images"
        );
    }

    #[test]
    fn test_image_term_after_negated_one_still_counts() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "Findings: right lower lobe pneumonia.",
            &images(&["No pneumothorax, opacity in right lower lobe"]),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_report_term_after_contrast_is_a_claim() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "No effusion, but dense pneumonia in the right base.",
            &images(&["Clear lung fields"]),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, DiscrepancyKind::FalsePositive);
        assert_eq!(
            result[0].description,
            "Pneumonia mentioned in report but corresponding opacity not clearly visible in images"
        );
    }

    #[test]
    fn test_no_cross_modal_rules_without_images() {
        let detector = DiscrepancyDetector::new();
        assert!(detector.detect("Findings compatible with pneumonia.", &[]).is_empty());
    }

    #[test]
    fn test_negated_report_term_is_not_a_claim() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "No pneumonia. No effusion.",
            &images(&["Clear lung fields"]),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_false_negative() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "Heart size within limits. Lungs are clear.",
            &images(&["Small left pleural effusion"]),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, DiscrepancyKind::FalseNegative);
        assert_eq!(result[0].severity, Severity::High);
        assert_eq!(
            result[0].description,
            "Effusion detected in images but not mentioned in report"
        );
    }

    #[test]
    fn test_rules_fire_in_order() {
        let detector = DiscrepancyDetector::new();
        let result = detector.detect(
            "Normal mediastinum. Abnormal right base with pneumonia.",
            &images(&["Nodule in the left upper lobe"]),
        );

        let kinds: Vec<_> = result.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiscrepancyKind::Inconsistency,
                DiscrepancyKind::FalsePositive,
                DiscrepancyKind::FalseNegative,
            ]
        );
    }

    #[test]
    fn test_agreement() {
        let detector = DiscrepancyDetector::new();

        // One claim, supported; one observation
        assert_eq!(
            detector.agreement(
                "Right lower lobe pneumonia.",
                &images(&["Mild opacity in right lower lobe"])
            ),
            100.0
        );

        // One claim, unsupported; no observation
        assert_eq!(
            detector.agreement("Right lower lobe pneumonia.", &images(&["Clear lungs"])),
            0.0
        );

        // Nothing asserted either way
        assert_eq!(detector.agreement("Lungs clear.", &images(&["Clear lungs"])), 100.0);

        // 2 * 1 / (2 + 1)
        assert_eq!(
            detector.agreement(
                "Pneumonia with a small fracture.",
                &images(&["Opacity at the right base"])
            ),
            66.7
        );
    }
}
