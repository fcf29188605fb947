//! Analysis input: the immutable value the engine runs over.
//!
//! Inputs are built either in code through [`AnalysisInputBuilder`] or from
//! a YAML/JSON request document validated against
//! `schema/analysis_request.schema.json`.

mod request;
mod schema;

pub use request::{InputError, RequestDocument};
pub use schema::validate_request_schema;

use serde::Serialize;

use crate::types::StudyType;
use crate::ValidationError;

/// One submission. Constructed once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisInput {
    report_text: String,
    study_type: StudyType,
    patient_id: Option<String>,
    image_findings: Vec<String>,
    image_confidences: Vec<f64>,
}

impl AnalysisInput {
    /// Text-only input.
    pub fn new(
        report_text: impl Into<String>,
        study_type: StudyType,
    ) -> Result<Self, ValidationError> {
        Self::builder(report_text, study_type).build()
    }

    pub fn builder(report_text: impl Into<String>, study_type: StudyType) -> AnalysisInputBuilder {
        AnalysisInputBuilder {
            report_text: report_text.into(),
            study_type,
            patient_id: None,
            image_findings: Vec::new(),
            image_confidences: Vec::new(),
        }
    }

    pub fn report_text(&self) -> &str {
        &self.report_text
    }

    pub fn study_type(&self) -> StudyType {
        self.study_type
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn image_findings(&self) -> &[String] {
        &self.image_findings
    }

    /// One entry per classified image.
    pub fn image_confidences(&self) -> &[f64] {
        &self.image_confidences
    }

    /// True when any image produced findings or a confidence.
    pub fn has_images(&self) -> bool {
        !self.image_findings.is_empty() || !self.image_confidences.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.image_confidences.len()
    }
}

/// Builder for [`AnalysisInput`].
#[derive(Debug, Clone)]
pub struct AnalysisInputBuilder {
    report_text: String,
    study_type: StudyType,
    patient_id: Option<String>,
    image_findings: Vec<String>,
    image_confidences: Vec<f64>,
}

impl AnalysisInputBuilder {
    pub fn patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn image_findings(mut self, findings: Vec<String>) -> Self {
        self.image_findings = findings;
        self
    }

    pub fn image_confidences(mut self, confidences: Vec<f64>) -> Self {
        self.image_confidences = confidences;
        self
    }

    /// Add the output of one image classification.
    pub fn image(mut self, findings: impl IntoIterator<Item = String>, confidence: f64) -> Self {
        self.image_findings.extend(findings);
        self.image_confidences.push(confidence);
        self
    }

    /// Check field-level constraints and build the input.
    ///
    /// Content checks (length, medical keywords) are left to
    /// [`ContentValidator`](crate::ContentValidator).
    pub fn build(self) -> Result<AnalysisInput, ValidationError> {
        if self.report_text.trim().is_empty() {
            return Err(ValidationError::EmptyReport);
        }

        if let Some((index, &value)) = self
            .image_confidences
            .iter()
            .enumerate()
            .find(|(_, c)| !(0.0..=100.0).contains(*c))
        {
            return Err(ValidationError::ConfidenceOutOfRange { index, value });
        }

        let image_findings = self
            .image_findings
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        Ok(AnalysisInput {
            report_text: self.report_text,
            study_type: self.study_type,
            patient_id: self.patient_id.filter(|p| !p.trim().is_empty()),
            image_findings,
            image_confidences: self.image_confidences,
        })
    }
}
