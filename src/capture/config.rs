//! Camera capture configuration.

use super::FacingMode;
use crate::config::ConfigError;
use crate::tag::QrOptions;
use serde::{Deserialize, Serialize};

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Preferred frame width in pixels; the device may pick another.
    pub ideal_width: u32,
    /// Preferred frame height in pixels.
    pub ideal_height: u32,
    /// Camera to ask for when no device is selected explicitly.
    pub facing: FacingMode,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// Tag rendering options.
    pub tag: QrOptions,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing: FacingMode::Environment,
            jpeg_quality: 80,
            tag: QrOptions::default(),
        }
    }
}

impl CaptureConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        Ok(())
    }
}
