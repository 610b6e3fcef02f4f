//! JSON result returned for every upload attempt.

use super::{StoredPhoto, UploadError};
use serde::{Deserialize, Serialize};

/// Outcome of one upload, serialized as
/// `{"success": bool, "error": string, "filepath": string}`.
///
/// `filepath` is only meaningful when `success` is true.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadResult {
    /// Whether the file was stored.
    pub success: bool,
    /// Failure message, empty on success.
    #[serde(default)]
    pub error: String,
    /// Stored path, empty on failure.
    #[serde(default)]
    pub filepath: String,
}

impl UploadResult {
    /// A successful upload stored at `filepath`.
    pub fn stored(filepath: impl Into<String>) -> Self {
        Self {
            success: true,
            error: String::new(),
            filepath: filepath.into(),
        }
    }

    /// A refused upload.
    pub fn failed(error: &UploadError) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            filepath: String::new(),
        }
    }
}

impl From<&Result<StoredPhoto, UploadError>> for UploadResult {
    fn from(outcome: &Result<StoredPhoto, UploadError>) -> Self {
        match outcome {
            Ok(stored) => Self::stored(stored.display_path()),
            Err(err) => Self::failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(UploadResult::stored("uploads/img_1.jpg")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "error": "", "filepath": "uploads/img_1.jpg"})
        );
    }

    #[test]
    fn test_failure_has_no_path() {
        let result = UploadResult::failed(&UploadError::MethodNotAllowed);
        assert!(!result.success);
        assert!(result.filepath.is_empty());
        assert!(result.error.contains("Only POST"));
    }

    #[test]
    fn test_missing_fields_default() {
        let result: UploadResult = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(result, UploadResult::default());
    }
}
