//! Report Quality Assessor
//!
//! Structural quality of the submitted report text, independent of what
//! the report actually says.
//!
//! | Score | Basis |
//! |-------|-------|
//! | **Completeness** | +40 findings, +40 impression, +10 history, +10 technique, +10/+5 for length |
//! | **Clarity** | 70 base, sentence length, vague wording, medical vocabulary |
//! | **Readability** | Average words per sentence |
//! | **Overall** | Mean of the three |

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::patterns::split_sentences;

/// Standard radiology report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    ClinicalHistory,
    Technique,
    Findings,
    Impression,
}

impl ReportSection {
    pub const ALL: [ReportSection; 4] = [
        ReportSection::ClinicalHistory,
        ReportSection::Technique,
        ReportSection::Findings,
        ReportSection::Impression,
    ];

    /// Phrases that indicate the section is present.
    fn indicators(&self) -> &'static [&'static str] {
        match self {
            ReportSection::ClinicalHistory => &["clinical history", "history", "indication"],
            ReportSection::Technique => &["technique", "method", "protocol"],
            ReportSection::Findings => &["findings", "observations", "results"],
            ReportSection::Impression => &["impression", "conclusion", "diagnosis", "assessment"],
        }
    }

    fn completeness_weight(&self) -> f64 {
        match self {
            ReportSection::Findings | ReportSection::Impression => 40.0,
            ReportSection::ClinicalHistory | ReportSection::Technique => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            QualityGrade::Excellent
        } else if score >= 75.0 {
            QualityGrade::Good
        } else if score >= 65.0 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }
}

/// Quality metrics for one report. Scores are 0-100, one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportQuality {
    pub overall_score: f64,
    pub completeness_score: f64,
    pub clarity_score: f64,
    pub readability_score: f64,
    pub word_count: usize,
    pub sentence_count: usize,
    /// Distinct medical terms used
    pub medical_term_count: usize,
    pub sections: Vec<ReportSection>,
    pub grade: QualityGrade,
}

lazy_static! {
    static ref MEDICAL_TERM: Regex = Regex::new(
        r"(?i)\b(pneumonia|consolidation|opacity|infiltrate|effusion|pneumothorax|fracture|dislocation|nodule|mass|lesion|cardiomegaly|atelectasis|radiograph|ct|mri|ultrasound|contrast|anterior|posterior|lateral|medial|superior|inferior)\b"
    ).unwrap();

    static ref VAGUE_WORD: Regex = Regex::new(
        r"(?i)\b(thing|stuff|something|maybe|perhaps)\b"
    ).unwrap();
}

pub struct ReportQualityAssessor;

impl ReportQualityAssessor {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, text: &str) -> ReportQuality {
        let word_count = text.split_whitespace().count();
        let sentence_count = split_sentences(text).len();
        let sections = self.identify_sections(text);
        let medical_term_count = self.count_medical_terms(text);

        let completeness = self.completeness(&sections, word_count);
        let clarity = self.clarity(text, word_count, sentence_count, medical_term_count);
        let readability = self.readability(word_count, sentence_count);
        let overall = (completeness + clarity + readability) / 3.0;

        ReportQuality {
            overall_score: round1(overall),
            completeness_score: round1(completeness),
            clarity_score: round1(clarity),
            readability_score: round1(readability),
            word_count,
            sentence_count,
            medical_term_count,
            sections,
            grade: QualityGrade::from_score(overall),
        }
    }

    fn identify_sections(&self, text: &str) -> Vec<ReportSection> {
        let lower = text.to_lowercase();
        ReportSection::ALL
            .into_iter()
            .filter(|section| section.indicators().iter().any(|i| lower.contains(i)))
            .collect()
    }

    fn count_medical_terms(&self, text: &str) -> usize {
        MEDICAL_TERM
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }

    fn completeness(&self, sections: &[ReportSection], word_count: usize) -> f64 {
        let mut score: f64 = sections.iter().map(|s| s.completeness_weight()).sum();

        if word_count >= 50 {
            score += 10.0;
        } else if word_count >= 30 {
            score += 5.0;
        }

        score.min(100.0)
    }

    fn clarity(
        &self,
        text: &str,
        word_count: usize,
        sentence_count: usize,
        medical_term_count: usize,
    ) -> f64 {
        let mut score = 70.0;

        if sentence_count > 0 {
            let average = word_count as f64 / sentence_count as f64;
            if (8.0..=25.0).contains(&average) {
                score += 15.0;
            } else {
                score -= 10.0;
            }
        }

        if VAGUE_WORD.is_match(text) {
            score -= 15.0;
        }

        if medical_term_count >= 3 {
            score += 10.0;
        }

        f64::clamp(score, 0.0, 100.0)
    }

    fn readability(&self, word_count: usize, sentence_count: usize) -> f64 {
        if sentence_count == 0 {
            return 0.0;
        }

        let average = word_count as f64 / sentence_count as f64;
        if (10.0..=20.0).contains(&average) {
            85.0
        } else if (8.0..=25.0).contains(&average) {
            75.0
        } else {
            60.0
        }
    }
}

impl Default for ReportQualityAssessor {
    fn default() -> Self {
        Self::new()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
