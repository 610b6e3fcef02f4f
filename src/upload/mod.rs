//! Upload validation and storage.
//!
//! This is the framework-independent half of the upload endpoint: it
//! receives the bytes of one file field, decides whether they may be
//! stored, and persists them under the upload directory. The HTTP layer
//! in [`crate::server`] only extracts the field and serializes the
//! [`UploadResult`].
//!
//! # Checks
//!
//! In order:
//! 1. content type sniffed from the bytes is in the allow-list
//! 2. size is within the limit (5 MiB by default)
//! 3. upload directory exists (created on demand)
//! 4. file is staged, synced, and moved to a fresh unique name

mod error;
mod result;
mod service;
mod sniff;
mod store;

pub use error::UploadError;
pub use result::UploadResult;
pub use service::{
    ExtensionSource, IncomingFile, StoredPhoto, UploadPolicy, UploadService, DEFAULT_MAX_BYTES,
};
pub use sniff::{sniff, ImageKind, Sniffed};
pub use store::PhotoStore;

/// Name of the multipart field that carries the photo.
pub const PHOTO_FIELD: &str = "photo";
