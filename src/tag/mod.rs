//! Timestamp tags for captured photos.
//!
//! Every capture gets a human-readable tag code derived from the local
//! time (`IMG_YYYYMMDD_HHMMSS`), which is then rendered as a QR code and
//! shown next to the preview.

mod code;
mod qr;

pub use code::TagCode;
pub use qr::{render_svg, CorrectionLevel, QrOptions, RenderedTag, TagError};
