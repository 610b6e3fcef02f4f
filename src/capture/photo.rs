//! Still photos captured from a stream.

use super::Frame;
use crate::tag::TagCode;
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, RgbImage};

/// MIME type of every captured photo.
pub const PHOTO_MIME_TYPE: &str = "image/jpeg";

/// A JPEG-encoded still, held in memory until uploaded or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// JPEG bytes.
    pub encoded_image: Bytes,
    /// Always [`PHOTO_MIME_TYPE`].
    pub mime_type: &'static str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tag code assigned at capture time.
    pub tag: TagCode,
}

impl CapturedPhoto {
    /// Encodes `frame` as JPEG at the given quality (1-100).
    pub fn encode(frame: &Frame, quality: u8, tag: TagCode) -> Result<Self, EncodeError> {
        let encoded_image = encode_jpeg(frame, quality)?;
        Ok(Self {
            encoded_image,
            mime_type: PHOTO_MIME_TYPE,
            width: frame.width(),
            height: frame.height(),
            tag,
        })
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.encoded_image.len()
    }

    /// Whether the encoded image is empty.
    pub fn is_empty(&self) -> bool {
        self.encoded_image.is_empty()
    }
}

/// JPEG encoding failures.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The pixel buffer does not match the frame dimensions.
    #[error("frame buffer does not match {width}x{height}")]
    InvalidFrame {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },
    /// The JPEG encoder failed.
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Encodes an RGB frame as JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Bytes, EncodeError> {
    let invalid = || EncodeError::InvalidFrame {
        width: frame.width(),
        height: frame.height(),
    };
    if !frame.is_valid() {
        return Err(invalid());
    }
    let img = RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or_else(invalid)?;

    let mut jpeg_bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg_bytes, quality.clamp(1, 100));
    encoder.encode_image(&img)?;

    Ok(Bytes::from(jpeg_bytes))
}
