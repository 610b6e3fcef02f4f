//! Scoped ownership of a live stream.

use super::{CameraError, Frame, MediaStream};

/// Owns an open [`MediaStream`] and stops it when dropped.
///
/// Whatever ends a session (a capture, an error, a camera switch, the
/// controller going away) drops the guard, and the device is released.
pub struct StreamGuard {
    stream: Box<dyn MediaStream>,
}

impl StreamGuard {
    /// Takes ownership of an opened stream.
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self { stream }
    }

    /// Id of the device behind the stream.
    pub fn device_id(&self) -> &str {
        self.stream.device_id()
    }

    /// Grabs the current frame.
    pub fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        self.stream.grab_frame()
    }

    /// Stops the stream now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if self.stream.is_live() {
            self.stream.stop();
            tracing::info!(device = %self.stream.device_id(), "Camera stream stopped");
        }
    }
}

impl std::fmt::Debug for StreamGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamGuard")
            .field("device_id", &self.stream.device_id())
            .field("live", &self.stream.is_live())
            .finish()
    }
}
