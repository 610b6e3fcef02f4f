//! Frame type representing a captured image with metadata.

/// A single RGB frame from a camera stream.
#[derive(Clone)]
pub struct Frame {
    /// Packed RGB8 pixel data, row-major.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Monotonic sequence number within the producing backend.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Returns the raw RGB pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the frame sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Expected buffer length for the frame dimensions.
    #[inline]
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 3
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.expected_len()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(vec![0u8; 64 * 48 * 3], 64, 48, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let frame = Frame::new(vec![0u8; 100], 64, 48, 1);
        assert!(!frame.is_valid());
    }
}
