//! JSON Schema validation for analysis request documents.
//!
//! Requests are validated against `schema/analysis_request.schema.json`
//! before they are deserialized.

use std::sync::OnceLock;

/// Embedded request schema (loaded at compile time).
const REQUEST_SCHEMA_JSON: &str = include_str!("../../../../schema/analysis_request.schema.json");

/// Compiled validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn validator() -> Result<&'static jsonschema::Validator, String> {
    COMPILED_SCHEMA
        .get_or_init(|| {
            let schema: serde_json::Value = serde_json::from_str(REQUEST_SCHEMA_JSON)
                .map_err(|e| format!("Invalid schema JSON: {}", e))?;
            jsonschema::options()
                .build(&schema)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a request document.
///
/// Returns every violation as `"<message> at <path>"`.
pub fn validate_request_schema(request: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(request)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_request_passes() {
        let value = json!({
            "report_text": "FINDINGS: clear lungs.",
            "study_type": "chest-xray"
        });
        assert!(validate_request_schema(&value).is_ok());
    }

    #[test]
    fn test_missing_study_type_fails() {
        let value = json!({ "report_text": "FINDINGS: clear lungs." });
        assert!(validate_request_schema(&value).is_err());
    }

    #[test]
    fn test_unknown_study_type_fails() {
        let value = json!({
            "report_text": "FINDINGS: clear lungs.",
            "study_type": "pet-scan"
        });
        assert!(validate_request_schema(&value).is_err());
    }

    #[test]
    fn test_confidence_out_of_range_reports_path() {
        let value = json!({
            "report_text": "FINDINGS: clear lungs.",
            "study_type": "mri",
            "image_confidences": [80, 140]
        });
        let errors = validate_request_schema(&value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("/image_confidences/1"));
    }

    #[test]
    fn test_unknown_field_fails() {
        let value = json!({
            "report_text": "FINDINGS: clear lungs.",
            "study_type": "mri",
            "priority": "stat"
        });
        assert!(validate_request_schema(&value).is_err());
    }
}
