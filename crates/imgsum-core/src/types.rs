//! Result records passed across the provider and workflow boundaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open-ended diagnostic data attached to results (model id, token usage).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Summary text used when none of the requested paths exist.
pub const NO_VALID_IMAGES_SUMMARY: &str = "No valid images found to process.";

/// Error message used when none of the requested paths exist.
pub const NO_VALID_IMAGES_ERROR: &str = "No valid image files found";

/// Summary text used when every image failed to be described.
pub const NO_IMAGES_PROCESSED_SUMMARY: &str = "No images could be processed successfully.";

/// The outcome of describing a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescription {
    /// Path exactly as the caller supplied it
    pub image_path: String,

    /// Generated description (empty on failure)
    pub description: String,

    /// Whether the provider produced a description
    pub success: bool,

    /// Why the description failed; set iff `success` is false
    pub error_message: Option<String>,

    /// Provider-specific diagnostics, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl ImageDescription {
    /// A successful description.
    pub fn success(
        image_path: impl Into<String>,
        description: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            description: description.into(),
            success: true,
            error_message: None,
            metadata,
        }
    }

    /// A failed description carrying the reason.
    pub fn failure(image_path: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            description: String::new(),
            success: false,
            error_message: Some(error_message.into()),
            metadata: None,
        }
    }

    /// Failure record for a path that does not exist on disk.
    pub fn not_found(image_path: impl Into<String>) -> Self {
        let image_path = image_path.into();
        let message = format!("Image file not found: {image_path}");
        Self::failure(image_path, message)
    }
}

/// The result of one `process_images` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Consolidated summary text
    pub summary: String,

    /// Successful descriptions, in input order
    pub descriptions: Vec<ImageDescription>,

    /// Number of paths originally requested
    pub total_images: usize,

    /// Number of entries in `descriptions`
    pub successful_descriptions: usize,

    /// Missing paths first, then paths whose description failed
    pub failed_images: Vec<String>,

    /// Set only when the whole call failed
    pub error_message: Option<String>,

    /// Which provider and batch size produced this result
    pub metadata: Option<Metadata>,
}

impl SummaryResult {
    /// Result for a call where none of the paths exist.
    pub fn no_valid_images(image_paths: &[String]) -> Self {
        Self {
            summary: NO_VALID_IMAGES_SUMMARY.to_string(),
            descriptions: Vec::new(),
            total_images: image_paths.len(),
            successful_descriptions: 0,
            failed_images: image_paths.to_vec(),
            error_message: Some(NO_VALID_IMAGES_ERROR.to_string()),
            metadata: None,
        }
    }

    /// Result for a call aborted by an unexpected failure.
    ///
    /// Every input is reported as failed and earlier batch results are dropped.
    pub fn workflow_error(image_paths: &[String], message: impl std::fmt::Display) -> Self {
        Self {
            summary: String::new(),
            descriptions: Vec::new(),
            total_images: image_paths.len(),
            successful_descriptions: 0,
            failed_images: image_paths.to_vec(),
            error_message: Some(format!("Workflow error: {message}")),
            metadata: None,
        }
    }

    /// Whether every requested image was described.
    pub fn is_complete(&self) -> bool {
        self.error_message.is_none() && self.successful_descriptions == self.total_images
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let desc = ImageDescription::success("/path/to/image.jpg", "A test image", None);
        assert_eq!(desc.image_path, "/path/to/image.jpg");
        assert_eq!(desc.description, "A test image");
        assert!(desc.success);
        assert!(desc.error_message.is_none());
    }

    #[test]
    fn test_failure_has_empty_description() {
        let desc = ImageDescription::failure("a.png", "boom");
        assert!(!desc.success);
        assert!(desc.description.is_empty());
        assert_eq!(desc.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_not_found_message() {
        let desc = ImageDescription::not_found("/missing.jpg");
        assert_eq!(
            desc.error_message.as_deref(),
            Some("Image file not found: /missing.jpg")
        );
    }

    #[test]
    fn test_no_valid_images_keeps_full_input() {
        let paths = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        let result = SummaryResult::no_valid_images(&paths);
        assert_eq!(result.summary, NO_VALID_IMAGES_SUMMARY);
        assert_eq!(result.total_images, 2);
        assert_eq!(result.failed_images, paths);
        assert_eq!(result.error_message.as_deref(), Some(NO_VALID_IMAGES_ERROR));
        assert!(!result.is_complete());
    }

    #[test]
    fn test_workflow_error_prefix() {
        let paths = vec!["a.jpg".to_string()];
        let result = SummaryResult::workflow_error(&paths, "model exploded");
        assert!(result.summary.is_empty());
        assert_eq!(
            result.error_message.as_deref(),
            Some("Workflow error: model exploded")
        );
    }

    #[test]
    fn test_metadata_skipped_when_absent() {
        let desc = ImageDescription::success("a.jpg", "x", None);
        let json = serde_json::to_value(&desc).unwrap();
        assert!(json.get("metadata").is_none());
        assert!(json.get("error_message").unwrap().is_null());
    }
}
