//! HTTP uploader for captured photos.

use crate::capture::{CapturedPhoto, TransportError, Uploader};
use crate::upload::{UploadResult, PHOTO_FIELD};
use reqwest::multipart::{Form, Part};

/// Filename declared for every uploaded capture.
pub const CAPTURE_FILE_NAME: &str = "capture.jpg";

/// Posts photos as `multipart/form-data` to an upload endpoint.
///
/// No timeout and no retries: a slow server keeps the caller waiting
/// until the transport gives up.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpUploader {
    /// Creates an uploader with a default client.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    /// Creates an uploader sharing an existing client.
    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Upload URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Uploader for HttpUploader {
    async fn upload(&self, photo: &CapturedPhoto) -> Result<UploadResult, TransportError> {
        let part = Part::bytes(photo.encoded_image.to_vec())
            .file_name(CAPTURE_FILE_NAME)
            .mime_str(photo.mime_type)
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let form = Form::new().part(PHOTO_FIELD, part);

        tracing::debug!(endpoint = %self.endpoint, bytes = photo.len(), "Uploading photo");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        response
            .json::<UploadResult>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}
