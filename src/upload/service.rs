//! Upload acceptance pipeline.

use super::{sniff, ImageKind, PhotoStore, UploadError};
use crate::config::UploadConfig;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default size limit: 5 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Multipart overhead allowed on top of the file itself.
const BODY_OVERHEAD: u64 = 64 * 1024;

/// Where the stored file's extension comes from.
///
/// `Client` trusts the declared filename, so a PNG uploaded as
/// `photo.jpg` is stored with `.jpg`. `Sniffed` always uses the detected
/// type's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionSource {
    /// Use the client-declared filename's extension.
    #[default]
    Client,
    /// Use the sniffed type's extension.
    Sniffed,
}

/// Validation rules applied to every upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum accepted file size in bytes (inclusive).
    pub max_bytes: u64,
    /// Accepted content types.
    pub allowed: Vec<ImageKind>,
    /// Source of the stored file's extension.
    pub extension: ExtensionSource,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed: ImageKind::ALL.to_vec(),
            extension: ExtensionSource::Client,
        }
    }
}

impl UploadPolicy {
    /// Request body limit for the HTTP layer.
    ///
    /// Large enough that moderately oversized files still reach the size
    /// check and get a precise error.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_bytes.saturating_mul(2).saturating_add(BODY_OVERHEAD))
            .unwrap_or(usize::MAX)
    }
}

/// One received file field.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Client-declared filename, if any.
    pub file_name: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

impl IncomingFile {
    /// Wraps a received field.
    pub fn new(file_name: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name,
            bytes: bytes.into(),
        }
    }
}

/// A photo that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Final location on disk.
    pub path: PathBuf,
    /// Sniffed content type.
    pub kind: ImageKind,
    /// Size in bytes.
    pub size: u64,
}

impl StoredPhoto {
    /// Path as reported back to the client.
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Validates uploads and hands accepted ones to the [`PhotoStore`].
///
/// Stateless across calls; safe to share between concurrent requests.
#[derive(Debug, Clone)]
pub struct UploadService {
    policy: UploadPolicy,
    store: PhotoStore,
}

impl UploadService {
    /// Creates a service from a policy and a store.
    pub fn new(policy: UploadPolicy, store: PhotoStore) -> Self {
        Self { policy, store }
    }

    /// Builds the service from file configuration.
    pub fn from_config(config: &UploadConfig) -> Self {
        let policy = UploadPolicy {
            max_bytes: config.max_bytes,
            extension: config.extension,
            ..Default::default()
        };
        Self::new(policy, PhotoStore::new(&config.dir))
    }

    /// Validation rules.
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Backing store.
    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    /// Runs the content checks without touching the filesystem.
    pub fn validate(&self, file: &IncomingFile) -> Result<ImageKind, UploadError> {
        let sniffed = sniff(&file.bytes);
        let kind = match sniffed.image_kind() {
            Some(kind) if self.policy.allowed.contains(&kind) => kind,
            _ => {
                return Err(UploadError::UnsupportedMediaType {
                    detected: sniffed.mime_type(),
                })
            }
        };

        let size = file.bytes.len() as u64;
        if size > self.policy.max_bytes {
            return Err(UploadError::PayloadTooLarge {
                size: Some(size),
                limit: self.policy.max_bytes,
            });
        }

        Ok(kind)
    }

    /// Validates and stores one file.
    pub fn accept(&self, file: IncomingFile) -> Result<StoredPhoto, UploadError> {
        let kind = self.validate(&file)?;

        self.store
            .ensure_dir()
            .map_err(UploadError::StorageWrite)?;

        let extension = self.extension_for(file.file_name.as_deref(), kind);
        let path = self
            .store
            .persist(&file.bytes, &extension)
            .map_err(UploadError::StorageWrite)?;

        tracing::info!(
            path = %path.display(),
            size_bytes = file.bytes.len(),
            kind = %kind,
            "Photo stored"
        );

        Ok(StoredPhoto {
            path,
            kind,
            size: file.bytes.len() as u64,
        })
    }

    fn extension_for(&self, file_name: Option<&str>, kind: ImageKind) -> String {
        if self.policy.extension == ExtensionSource::Client {
            let declared = file_name
                .and_then(|name| Path::new(name).extension())
                .and_then(|ext| ext.to_str())
                .filter(|ext| is_plain_extension(ext));
            if let Some(ext) = declared {
                return ext.to_string();
            }
        }
        kind.extension().to_string()
    }
}

/// 1-10 ASCII alphanumerics; anything else could smuggle path syntax.
fn is_plain_extension(ext: &str) -> bool {
    (1..=10).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}
