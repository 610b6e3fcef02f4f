//! QR rendering of tag codes.

use super::TagCode;
use qrcode::{render::svg, types::QrError, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while rendering a tag.
#[derive(Debug, Error)]
pub enum TagError {
    /// The code does not fit in a QR symbol.
    #[error("failed to encode QR code: {0}")]
    Encode(#[from] QrError),
}

/// Error correction level of the rendered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionLevel {
    /// About 7% recovery.
    Low,
    /// About 15% recovery.
    Medium,
    /// About 25% recovery.
    Quartile,
    /// About 30% recovery.
    #[default]
    High,
}

impl From<CorrectionLevel> for EcLevel {
    fn from(level: CorrectionLevel) -> Self {
        match level {
            CorrectionLevel::Low => EcLevel::L,
            CorrectionLevel::Medium => EcLevel::M,
            CorrectionLevel::Quartile => EcLevel::Q,
            CorrectionLevel::High => EcLevel::H,
        }
    }
}

/// Rendering options for the tag QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Color of dark modules.
    pub dark: String,
    /// Color of light modules and background.
    pub light: String,
    /// Error correction level.
    pub level: CorrectionLevel,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            dark: "#000000".to_string(),
            light: "#ffffff".to_string(),
            level: CorrectionLevel::High,
        }
    }
}

/// A tag code together with its rendered QR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTag {
    /// Code encoded in the QR symbol.
    pub code: TagCode,
    /// SVG document.
    pub svg: String,
}

impl RenderedTag {
    /// Renders `code` with the given options.
    pub fn render(code: TagCode, options: &QrOptions) -> Result<Self, TagError> {
        let svg = render_svg(&code, options)?;
        Ok(Self { code, svg })
    }
}

/// Renders a tag code as an SVG document.
pub fn render_svg(code: &TagCode, options: &QrOptions) -> Result<String, TagError> {
    let qr = QrCode::with_error_correction_level(code.as_str().as_bytes(), options.level.into())?;

    Ok(qr
        .render::<svg::Color<'_>>()
        .min_dimensions(options.width, options.height)
        .max_dimensions(options.width, options.height)
        .dark_color(svg::Color(&options.dark))
        .light_color(svg::Color(&options.light))
        .build())
}
