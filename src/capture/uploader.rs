//! Upload transport seam for the capture controller.

use super::CapturedPhoto;
use crate::upload::UploadResult;
use std::future::Future;
use thiserror::Error;

/// Failures before a server verdict was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or completed.
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with an unreadable body.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Sends a captured photo to the upload endpoint.
pub trait Uploader {
    /// Sends one photo and returns the server's verdict.
    fn upload(
        &self,
        photo: &CapturedPhoto,
    ) -> impl Future<Output = Result<UploadResult, TransportError>> + Send;
}
