//! Confidence Scorer
//!
//! Heuristic 0-100 trust score for an analysis narrative. Not a calibrated
//! probability.
//!
//! | Adjustment | Condition |
//! |------------|-----------|
//! | 70 | Base |
//! | +10 | More than 500 characters |
//! | +10 | Mentions "findings" or "recommendations" |
//! | +10 | Images were supplied |
//! | -5 each | Occurrence of an uncertainty term |
//!
//! The result is clamped to `[30, 95]`.

use super::patterns::{contains_any, count_occurrences, STRUCTURE_MARKERS, UNCERTAINTY_TERMS};

pub const BASE_CONFIDENCE: f64 = 70.0;
pub const MIN_CONFIDENCE: f64 = 30.0;
pub const MAX_CONFIDENCE: f64 = 95.0;

const LENGTH_THRESHOLD: usize = 500;
const BONUS: f64 = 10.0;
const UNCERTAINTY_PENALTY: f64 = 5.0;

pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `text`. Pure: identical arguments give identical output.
    pub fn score(&self, text: &str, has_images: bool) -> f64 {
        let lower = text.to_lowercase();
        let mut score = BASE_CONFIDENCE;

        if text.chars().count() > LENGTH_THRESHOLD {
            score += BONUS;
        }
        if contains_any(&lower, STRUCTURE_MARKERS) {
            score += BONUS;
        }
        if has_images {
            score += BONUS;
        }

        let uncertain: usize = UNCERTAINTY_TERMS
            .iter()
            .map(|term| count_occurrences(&lower, term))
            .sum();
        score -= UNCERTAINTY_PENALTY * uncertain as f64;

        score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}
