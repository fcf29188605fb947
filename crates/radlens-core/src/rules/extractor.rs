//! Text Finding Extractor
//!
//! Pulls discrete finding statements out of free text:
//! 1. List items (`-`, `•`, `*`, `1.`) in line order, skipping any
//!    recommendations section
//! 2. Otherwise, one synthetic finding per medical term present
//! 3. At most [`MAX_FINDINGS`] entries
//!
//! In [`ExtractionMode::Basic`] the result is never empty. In
//! [`ExtractionMode::Structured`] an empty result is returned as-is and the
//! aggregator treats it as a failed extraction.

use crate::finding::Finding;

use super::patterns::{capitalize, FINDING_TERMS, LIST_ITEM_PATTERN};

/// Upper bound on extracted findings.
pub const MAX_FINDINGS: usize = 10;

/// Emitted in basic mode when nothing else was found.
pub const NO_FINDINGS_MESSAGE: &str =
    "No structured findings identified in report - manual review recommended";

/// How the input text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Raw report text; never yields an empty list.
    Basic,
    /// Upstream narrative; may yield an empty list.
    Structured,
}

impl ExtractionMode {
    fn keyword_suffix(self) -> &'static str {
        match self {
            ExtractionMode::Basic => "noted in report",
            ExtractionMode::Structured => "identified in analysis",
        }
    }
}

/// The finding extractor.
pub struct FindingExtractor;

impl FindingExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract finding statements from `text`.
    pub fn extract(&self, text: &str, mode: ExtractionMode) -> Vec<String> {
        let mut findings: Vec<String> = self
            .list_items(text)
            .into_iter()
            .filter(|(section, _)| !is_recommendation_section(section.as_deref()))
            .map(|(_, item)| item)
            .collect();

        if findings.is_empty() {
            findings = self.keyword_findings(text, mode);
        }

        findings.truncate(MAX_FINDINGS);

        if findings.is_empty() && mode == ExtractionMode::Basic {
            findings.push(NO_FINDINGS_MESSAGE.to_string());
        }

        findings
    }

    /// Same as [`extract`](Self::extract), tagged as text-sourced findings.
    pub fn extract_tagged(&self, text: &str, mode: ExtractionMode) -> Vec<Finding> {
        self.extract(text, mode)
            .into_iter()
            .map(Finding::from_text)
            .collect()
    }

    /// List items under a heading that mentions recommendations.
    pub fn recommendation_items(&self, text: &str) -> Vec<String> {
        self.list_items(text)
            .into_iter()
            .filter(|(section, _)| is_recommendation_section(section.as_deref()))
            .map(|(_, item)| item)
            .collect()
    }

    /// Every list item paired with the heading it appears under.
    fn list_items(&self, text: &str) -> Vec<(Option<String>, String)> {
        let mut section: Option<String> = None;
        let mut items = Vec::new();

        for line in text.lines() {
            if let Some(caps) = LIST_ITEM_PATTERN.captures(line) {
                let item = caps.name("item").map(|m| m.as_str().trim()).unwrap_or("");
                if !item.is_empty() {
                    items.push((section.clone(), item.to_string()));
                }
            } else if let Some(heading) = section_heading(line) {
                section = Some(heading);
            }
        }

        items
    }

    fn keyword_findings(&self, text: &str, mode: ExtractionMode) -> Vec<String> {
        let lower = text.to_lowercase();
        FINDING_TERMS
            .iter()
            .filter(|term| lower.contains(*term))
            .map(|term| format!("{} {}", capitalize(term), mode.keyword_suffix()))
            .collect()
    }
}

impl Default for FindingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A heading is a `#`-prefixed line or a short line ending in `:`.
fn section_heading(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let title = if let Some(rest) = trimmed.strip_prefix('#') {
        rest.trim_start_matches('#')
    } else if let Some(rest) = trimmed.strip_suffix(':') {
        rest
    } else {
        return None;
    };

    let title = title.trim().trim_end_matches(':').trim();
    if title.is_empty() || title.chars().count() > 40 {
        None
    } else {
        Some(title.to_lowercase())
    }
}

fn is_recommendation_section(section: Option<&str>) -> bool {
    section.is_some_and(|s| s.contains("recommend"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingSource;
    use proptest::prelude::*;

    #[test]
    fn test_extracts_bullets_in_order() {
        let extractor = FindingExtractor::new();
        let text = "FINDINGS:\n- Right lower lobe opacity\n• Small left effusion\n* Heart size normal\n1. No pneumothorax";
        let findings = extractor.extract(text, ExtractionMode::Structured);

        assert_eq!(
            findings,
            vec![
                "Right lower lobe opacity",
                "Small left effusion",
                "Heart size normal",
                "No pneumothorax",
            ]
        );
    }

    #[test]
    fn test_skips_recommendation_section() {
        let extractor = FindingExtractor::new();
        let text = "## Findings\n- Opacity in the right base\nRecommendations:\n- Repeat radiograph in 6 weeks\n- Clinical correlation";
        let findings = extractor.extract(text, ExtractionMode::Structured);
        assert_eq!(findings, vec!["Opacity in the right base"]);

        let recommendations = extractor.recommendation_items(text);
        assert_eq!(
            recommendations,
            vec!["Repeat radiograph in 6 weeks", "Clinical correlation"]
        );
    }

    #[test]
    fn test_keyword_fallback_basic_mode() {
        let extractor = FindingExtractor::new();
        let findings = extractor.extract(
            "Consolidation in the left base with a small effusion.",
            ExtractionMode::Basic,
        );
        assert_eq!(
            findings,
            vec!["Consolidation noted in report", "Effusion noted in report"]
        );
    }

    #[test]
    fn test_keyword_fallback_structured_mode() {
        let extractor = FindingExtractor::new();
        let findings = extractor.extract("Findings suggest pneumonia.", ExtractionMode::Structured);
        assert_eq!(findings, vec!["Pneumonia identified in analysis"]);
    }

    #[test]
    fn test_abnormal_also_matches_normal_term() {
        let extractor = FindingExtractor::new();
        let findings = extractor.extract("Abnormal study.", ExtractionMode::Basic);
        assert_eq!(
            findings,
            vec!["Normal noted in report", "Abnormal noted in report"]
        );
    }

    #[test]
    fn test_basic_mode_never_empty() {
        let extractor = FindingExtractor::new();
        let findings = extractor.extract("Lungs are clear.", ExtractionMode::Basic);
        assert_eq!(findings, vec![NO_FINDINGS_MESSAGE]);
    }

    #[test]
    fn test_structured_mode_may_be_empty() {
        let extractor = FindingExtractor::new();
        assert!(extractor
            .extract("Lungs are clear.", ExtractionMode::Structured)
            .is_empty());
    }

    #[test]
    fn test_caps_at_ten() {
        let extractor = FindingExtractor::new();
        let text: String = (1..=15).map(|i| format!("- Finding {}\n", i)).collect();
        let findings = extractor.extract(&text, ExtractionMode::Basic);
        assert_eq!(findings.len(), MAX_FINDINGS);
        assert_eq!(findings[9], "Finding 10");
    }

    #[test]
    fn test_tagged_findings_are_text_sourced() {
        let extractor = FindingExtractor::new();
        let tagged = extractor.extract_tagged("- Nodule in the left apex", ExtractionMode::Basic);
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].source, FindingSource::Text);
    }

    proptest! {
        #[test]
        fn prop_never_more_than_ten(text in "(\\PC{0,40}\n){0,30}") {
            let extractor = FindingExtractor::new();
            prop_assert!(extractor.extract(&text, ExtractionMode::Structured).len() <= MAX_FINDINGS);
            prop_assert!(extractor.extract(&text, ExtractionMode::Basic).len() <= MAX_FINDINGS);
        }

        #[test]
        fn prop_basic_never_empty(text in "\\PC{0,200}") {
            let extractor = FindingExtractor::new();
            prop_assert!(!extractor.extract(&text, ExtractionMode::Basic).is_empty());
        }
    }
}
