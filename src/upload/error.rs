//! Upload failure taxonomy.

use thiserror::Error;

/// Reasons an upload is refused.
///
/// The `Display` text is what the client sees in the `error` field.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request used a method other than POST.
    #[error("Method not allowed. Only POST is accepted.")]
    MethodNotAllowed,

    /// The file field was missing or the multipart body was malformed.
    #[error("Error receiving the uploaded file: {0}")]
    Transport(String),

    /// The sniffed content type is not on the allow-list.
    #[error("File type not allowed ({detected}). Only JPEG, PNG or GIF images are accepted.")]
    UnsupportedMediaType {
        /// MIME type detected from the file contents.
        detected: &'static str,
    },

    /// The file exceeds the size limit.
    #[error("File is too large{}. Maximum size: {limit} bytes.", describe_size(.size))]
    PayloadTooLarge {
        /// File size in bytes, when known. Bodies cut off by the HTTP
        /// limit are only known by their declared `Content-Length`.
        size: Option<u64>,
        /// Configured maximum in bytes.
        limit: u64,
    },

    /// Writing the file to disk failed.
    #[error("Error saving the file on the server.")]
    StorageWrite(#[source] std::io::Error),
}

fn describe_size(size: &Option<u64>) -> String {
    match size {
        Some(size) => format!(" ({size} bytes)"),
        None => String::new(),
    }
}

impl UploadError {
    /// Short machine label, used for logging and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            UploadError::MethodNotAllowed => "method_not_allowed",
            UploadError::Transport(_) => "transport",
            UploadError::UnsupportedMediaType { .. } => "unsupported_media_type",
            UploadError::PayloadTooLarge { .. } => "payload_too_large",
            UploadError::StorageWrite(_) => "storage_write",
        }
    }
}
