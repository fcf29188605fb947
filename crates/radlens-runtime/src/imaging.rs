//! Image classification.
//!
//! The engine treats image classification as a swappable capability. The
//! built-in [`LookupTableClassifier`] is a fixed table keyed by study type;
//! it does not inspect pixels and says so in its name.
//!
//! | Study type | Findings | Confidence |
//! |------------|----------|------------|
//! | chest-xray | mild right lower lobe opacity, normal cardiac silhouette | 85 |
//! | ct-scan | no focal mass, unremarkable soft tissue | 88 |
//! | mri | no abnormal signal, normal alignment | 90 |
//! | ultrasound | normal echogenicity, no fluid collection | 82 |
//! | mammography | scattered fibroglandular density, no calcifications | 84 |
//! | other | adequate image quality | 75 |

use std::path::Path;

use async_trait::async_trait;
use radlens_core::StudyType;
use thiserror::Error;

use crate::providers::ProviderError;

/// Largest accepted single image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest accepted total across all images of one request.
pub const MAX_TOTAL_BYTES: usize = 8 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Image '{name}' is {size} bytes (limit {limit})")]
    ImageTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("Images total {size} bytes (limit {limit})")]
    TotalTooLarge { size: usize, limit: usize },

    #[error("Failed to read image '{name}': {reason}")]
    Unreadable { name: String, reason: String },
}

/// One uploaded image.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path).map_err(|e| UploadError::Unreadable {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Per-image and aggregate size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_image_bytes: usize,
    pub max_total_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            max_total_bytes: MAX_TOTAL_BYTES,
        }
    }
}

impl UploadLimits {
    pub fn check(&self, images: &[ImageUpload]) -> Result<(), UploadError> {
        if let Some(image) = images.iter().find(|i| i.len() > self.max_image_bytes) {
            return Err(UploadError::ImageTooLarge {
                name: image.name.clone(),
                size: image.len(),
                limit: self.max_image_bytes,
            });
        }

        let total: usize = images.iter().map(ImageUpload::len).sum();
        if total > self.max_total_bytes {
            return Err(UploadError::TotalTooLarge {
                size: total,
                limit: self.max_total_bytes,
            });
        }

        Ok(())
    }
}

/// Output of one image classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageClassification {
    pub findings: Vec<String>,
    /// 0-100
    pub confidence: f64,
}

/// Per-image classification capability.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn classify(
        &self,
        image: &ImageUpload,
        study_type: StudyType,
    ) -> Result<ImageClassification, ProviderError>;

    fn name(&self) -> &str;
}

/// Fixed findings per study type.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupTableClassifier;

impl LookupTableClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, study_type: StudyType) -> ImageClassification {
        let (findings, confidence): (&[&str], f64) = match study_type {
            StudyType::ChestXray => (
                &[
                    "Mild opacity in right lower lobe",
                    "Cardiac silhouette within normal limits",
                ],
                85.0,
            ),
            StudyType::CtScan => (
                &[
                    "No focal mass identified",
                    "Soft tissue structures unremarkable",
                ],
                88.0,
            ),
            StudyType::Mri => (
                &["No abnormal signal intensity", "Normal anatomical alignment"],
                90.0,
            ),
            StudyType::Ultrasound => (
                &[
                    "Organs demonstrate normal echogenicity",
                    "No fluid collection identified",
                ],
                82.0,
            ),
            StudyType::Mammography => (
                &[
                    "Scattered fibroglandular density",
                    "No suspicious calcifications",
                ],
                84.0,
            ),
            StudyType::Other => (&["Image quality adequate for interpretation"], 75.0),
        };

        ImageClassification {
            findings: findings.iter().map(|f| f.to_string()).collect(),
            confidence,
        }
    }
}

#[async_trait]
impl ImageClassifier for LookupTableClassifier {
    async fn classify(
        &self,
        image: &ImageUpload,
        study_type: StudyType,
    ) -> Result<ImageClassification, ProviderError> {
        if image.is_empty() {
            return Err(ProviderError::Parse(format!("image '{}' is empty", image.name)));
        }
        Ok(self.lookup(study_type))
    }

    fn name(&self) -> &str {
        "lookup-table"
    }
}
