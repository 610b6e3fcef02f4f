//! File configuration.
//!
//! All sections are optional; missing values fall back to defaults.
//!
//! ```toml
//! [capture]
//! ideal_width = 1280
//! ideal_height = 720
//! facing = "environment"
//! jpeg_quality = 80
//!
//! [upload]
//! dir = "uploads"
//! max_bytes = 5242880
//! extension = "client"
//!
//! [server]
//! bind_addr = "0.0.0.0:8080"
//! upload_path = "/backend/upload"
//! cors = false
//! ```

use crate::capture::CaptureConfig;
use crate::upload::{ExtensionSource, DEFAULT_MAX_BYTES};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Zero width or height.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// JPEG quality outside 1-100.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidJpegQuality(u8),
    /// Zero upload size limit.
    #[error("upload size limit must be non-zero")]
    InvalidSizeLimit,
    /// Upload path does not start with `/`.
    #[error("upload path must start with '/': {0}")]
    InvalidUploadPath(String),
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The configuration file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Upload storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded photos are stored in.
    pub dir: PathBuf,
    /// Maximum accepted file size in bytes.
    pub max_bytes: u64,
    /// Where stored file extensions come from.
    pub extension: ExtensionSource,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_bytes: DEFAULT_MAX_BYTES,
            extension: ExtensionSource::Client,
        }
    }
}

impl UploadConfig {
    /// Checks the upload settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::InvalidSizeLimit);
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
    /// Route of the upload endpoint.
    pub upload_path: String,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            upload_path: "/backend/upload".to_string(),
            cors: false,
        }
    }
}

impl ServerConfig {
    /// Checks the server settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.upload_path.starts_with('/') {
            return Err(ConfigError::InvalidUploadPath(self.upload_path.clone()));
        }
        Ok(())
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera and tag settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Upload validation and storage.
    #[serde(default)]
    pub upload: UploadConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.upload.validate()?;
        self.server.validate()
    }
}
