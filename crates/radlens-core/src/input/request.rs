//! Request document parsing from YAML/JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::validate_request_schema;
use super::AnalysisInput;
use crate::types::StudyType;
use crate::ValidationError;

/// Errors that can occur when loading a request document.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read request file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Wire shape of a request document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestDocument {
    pub report_text: String,

    pub study_type: StudyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    #[serde(default)]
    pub image_findings: Vec<String>,

    /// One entry per image
    #[serde(default)]
    pub image_confidences: Vec<f64>,
}

impl RequestDocument {
    pub fn into_input(self) -> Result<AnalysisInput, ValidationError> {
        let mut builder = AnalysisInput::builder(self.report_text, self.study_type)
            .image_findings(self.image_findings)
            .image_confidences(self.image_confidences);
        if let Some(patient_id) = self.patient_id {
            builder = builder.patient_id(patient_id);
        }
        builder.build()
    }
}

impl AnalysisInput {
    /// Parse a request from a YAML string (JSON is valid YAML).
    pub fn from_yaml(yaml: &str) -> Result<Self, InputError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a request from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a request file. `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, InputError> {
        validate_request_schema(&value).map_err(InputError::Schema)?;
        let document: RequestDocument = serde_json::from_value(value)?;
        Ok(document.into_input()?)
    }

    /// Wire form of this input.
    pub fn to_document(&self) -> RequestDocument {
        RequestDocument {
            report_text: self.report_text.clone(),
            study_type: self.study_type,
            patient_id: self.patient_id.clone(),
            image_findings: self.image_findings.clone(),
            image_confidences: self.image_confidences.clone(),
        }
    }
}
