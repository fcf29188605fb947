//! Content Validator
//!
//! **Question**: Does the submitted text resemble a medical report at all?
//!
//! | Outcome | Condition |
//! |---------|-----------|
//! | **Reject** | 50 characters or fewer |
//! | **Reject** | None of the medical content keywords present |
//! | **Accept** | Otherwise |

use crate::ValidationError;

use super::patterns::{contains_any, MEDICAL_CONTENT_KEYWORDS};

/// Text must be strictly longer than this many characters.
pub const MIN_REPORT_LENGTH: usize = 50;

/// Gatekeeper for report content.
pub struct ContentValidator;

impl ContentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Whether `text` passes the content gate.
    pub fn validate(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }

    /// Like [`validate`](Self::validate), with the rejection reason.
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        let length = text.chars().count();
        if length <= MIN_REPORT_LENGTH {
            return Err(ValidationError::TooShort {
                length,
                minimum: MIN_REPORT_LENGTH,
            });
        }

        if !contains_any(&text.to_lowercase(), MEDICAL_CONTENT_KEYWORDS) {
            return Err(ValidationError::NotMedicalContent);
        }

        Ok(())
    }
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_report() {
        let validator = ContentValidator::new();
        assert!(validator.validate(
            "FINDINGS: The patient has a focal opacity in the right lower lobe on this study."
        ));
    }

    #[test]
    fn test_rejects_short_text() {
        let validator = ContentValidator::new();
        let result = validator.check("Patient findings: normal.");
        assert!(matches!(result, Err(ValidationError::TooShort { .. })));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let validator = ContentValidator::new();
        let fifty = format!("patient {}", "x".repeat(42));
        assert_eq!(fifty.chars().count(), 50);
        assert!(!validator.validate(&fifty));

        let fifty_one = format!("{}x", fifty);
        assert!(validator.validate(&fifty_one));
    }

    #[test]
    fn test_rejects_non_medical_text() {
        let validator = ContentValidator::new();
        let result = validator.check(
            "The quarterly sales numbers went up again and everyone was very happy about it.",
        );
        assert!(matches!(result, Err(ValidationError::NotMedicalContent)));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let validator = ContentValidator::new();
        assert!(validator.validate(
            "RADIOLOGY REPORT - CHEST RADIOGRAPH WAS OBTAINED AND REVIEWED IN FULL TODAY."
        ));
    }

    proptest! {
        #[test]
        fn prop_short_text_never_validates(text in "\\PC{0,50}") {
            prop_assume!(text.chars().count() <= MIN_REPORT_LENGTH);
            prop_assert!(!ContentValidator::new().validate(&text));
        }

        #[test]
        fn prop_short_text_with_keywords_never_validates(prefix in "[a-z ]{0,20}") {
            let text = format!("patient study {}", prefix);
            prop_assume!(text.chars().count() <= MIN_REPORT_LENGTH);
            prop_assert!(!ContentValidator::new().validate(&text));
        }
    }
}
