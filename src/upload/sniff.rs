//! Content sniffing.
//!
//! The client-declared MIME type is never trusted; the real type is
//! determined from the leading bytes of the payload.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats the upload endpoint knows how to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// JPEG (`image/jpeg`).
    Jpeg,
    /// PNG (`image/png`).
    Png,
    /// GIF (`image/gif`).
    Gif,
}

impl ImageKind {
    /// Every supported kind.
    pub const ALL: [ImageKind; 3] = [ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif];

    /// Canonical MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Gif => Some(ImageKind::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Result of sniffing a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    /// One of the supported image kinds.
    Image(ImageKind),
    /// Anything else; carries the detected MIME type when the format was
    /// recognised at all.
    Other(Option<&'static str>),
}

impl Sniffed {
    /// MIME type of the sniffed content.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Sniffed::Image(kind) => kind.mime_type(),
            Sniffed::Other(Some(mime)) => mime,
            Sniffed::Other(None) => "application/octet-stream",
        }
    }

    /// The image kind, if the bytes are a recognised image.
    pub fn image_kind(&self) -> Option<ImageKind> {
        match self {
            Sniffed::Image(kind) => Some(*kind),
            Sniffed::Other(_) => None,
        }
    }
}

/// Determines the content type of `bytes` from their magic numbers.
pub fn sniff(bytes: &[u8]) -> Sniffed {
    match image::guess_format(bytes) {
        Ok(format) => match ImageKind::from_format(format) {
            Some(kind) => Sniffed::Image(kind),
            None => Sniffed::Other(Some(format.to_mime_type())),
        },
        Err(_) => Sniffed::Other(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_sniff_supported_kinds() {
        assert_eq!(
            sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            Sniffed::Image(ImageKind::Jpeg)
        );
        assert_eq!(sniff(PNG_MAGIC), Sniffed::Image(ImageKind::Png));
        assert_eq!(sniff(b"GIF89a\x01\x00"), Sniffed::Image(ImageKind::Gif));
        assert_eq!(sniff(b"GIF87a\x01\x00"), Sniffed::Image(ImageKind::Gif));
    }

    #[test]
    fn test_sniff_ignores_declared_name() {
        // A text file renamed to .jpg is still text.
        let sniffed = sniff(b"just some notes, not a photo\n");
        assert_eq!(sniffed, Sniffed::Other(None));
        assert_eq!(sniffed.mime_type(), "application/octet-stream");
        assert!(sniffed.image_kind().is_none());
    }

    #[test]
    fn test_sniff_reports_other_image_formats() {
        let sniffed = sniff(b"BM\x3a\x00\x00\x00\x00\x00\x00\x00\x36\x00\x00\x00");
        assert_eq!(sniffed, Sniffed::Other(Some("image/bmp")));
    }

    #[test]
    fn test_sniff_empty_input() {
        assert_eq!(sniff(&[]), Sniffed::Other(None));
    }

    #[test]
    fn test_kind_metadata() {
        for kind in ImageKind::ALL {
            assert!(kind.mime_type().starts_with("image/"));
            assert!(!kind.extension().is_empty());
        }
        assert_eq!(ImageKind::Jpeg.extension(), "jpg");
    }

    proptest! {
        #[test]
        fn prop_png_magic_wins_over_payload(tail in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut bytes = PNG_MAGIC.to_vec();
            bytes.extend_from_slice(&tail);
            prop_assert_eq!(sniff(&bytes), Sniffed::Image(ImageKind::Png));
        }

        #[test]
        fn prop_ascii_text_is_never_an_accepted_image(text in "[a-z ]{1,200}") {
            prop_assert!(sniff(text.as_bytes()).image_kind().is_none());
        }
    }
}
