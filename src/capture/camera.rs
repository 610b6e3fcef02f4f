//! Media device abstraction.
//!
//! A [`MediaDevices`] backend enumerates cameras and opens video streams;
//! a [`MediaStream`] is a live handle to one camera. Real hardware lives
//! behind the `camera` feature, [`MockDevices`] is always available.

use super::Frame;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Device enumeration failed.
    #[error("failed to enumerate devices: {0}")]
    EnumerationFailed(String),
    /// No device matched the requested id.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device could not be opened.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// A frame could not be read from the stream.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The stream has already been stopped.
    #[error("camera stream is not running")]
    NotStreaming,
}

/// Kind of media device, as reported during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Camera.
    VideoInput,
    /// Microphone.
    AudioInput,
    /// Speaker or other audio sink.
    AudioOutput,
}

/// An enumerated media device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Backend identifier used to reopen the device.
    pub device_id: String,
    /// Human-readable name.
    pub label: String,
    /// Device kind.
    pub kind: DeviceKind,
}

impl CameraDevice {
    /// Creates a video input device.
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

/// Which way a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera.
    User,
    /// Rear camera.
    #[default]
    Environment,
}

impl FacingMode {
    /// Label fragments that suggest a device faces this way.
    pub fn label_hints(self) -> &'static [&'static str] {
        match self {
            FacingMode::User => &["front", "user", "facetime"],
            FacingMode::Environment => &["back", "rear", "environment"],
        }
    }

    /// Whether a device label hints at this facing.
    pub fn matches_label(self, label: &str) -> bool {
        let label = label.to_ascii_lowercase();
        self.label_hints().iter().any(|hint| label.contains(hint))
    }
}

/// How to pick the device for a new stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelection {
    /// Exactly this device; fail if unavailable.
    Exact(String),
    /// Any device, preferring one facing this way.
    Facing(FacingMode),
}

/// Video-only stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Which device to open.
    pub selection: DeviceSelection,
    /// Preferred frame width.
    pub ideal_width: u32,
    /// Preferred frame height.
    pub ideal_height: u32,
}

/// A live camera stream.
pub trait MediaStream {
    /// Identifier of the device producing this stream.
    fn device_id(&self) -> &str;

    /// Grabs the current frame at the stream's native resolution.
    fn grab_frame(&mut self) -> Result<Frame, CameraError>;

    /// Whether the stream still holds the device.
    fn is_live(&self) -> bool;

    /// Stops all tracks and releases the device. Idempotent.
    fn stop(&mut self);
}

/// Source of cameras and streams.
pub trait MediaDevices {
    /// Lists available media devices.
    fn enumerate(&mut self) -> Result<Vec<CameraDevice>, CameraError>;

    /// Opens a new video stream.
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// Counters shared between a [`MockDevices`] and the streams it opened.
#[derive(Debug, Default)]
pub struct MockStats {
    opened: AtomicUsize,
    stopped: AtomicUsize,
    frames: AtomicU64,
}

impl MockStats {
    /// Streams opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams stopped so far.
    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Streams currently holding a device.
    pub fn active(&self) -> usize {
        self.opened() - self.stopped()
    }
}

/// Mock backend that produces deterministic synthetic frames.
///
/// Every frame differs from the previous one, so two captures never
/// encode to the same bytes.
#[derive(Debug)]
pub struct MockDevices {
    devices: Vec<CameraDevice>,
    width: u32,
    height: u32,
    fail_enumerate: bool,
    fail_open: bool,
    stats: Arc<MockStats>,
}

impl MockDevices {
    /// A backend with `count` cameras; the last one is the rear camera.
    pub fn new(count: usize) -> Self {
        let devices = (0..count)
            .map(|i| {
                let facing = if i + 1 == count { "back" } else { "front" };
                CameraDevice::video(format!("mock-{i}"), format!("Mock Camera {i} ({facing})"))
            })
            .collect();
        Self {
            devices,
            width: 64,
            height: 48,
            fail_enumerate: false,
            fail_open: false,
            stats: Arc::default(),
        }
    }

    /// Sets the native resolution of produced frames.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Makes enumeration fail.
    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumerate = true;
        self
    }

    /// Makes every subsequent `open` fail (or succeed again).
    pub fn set_fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Shared open/stop counters.
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn select(&self, selection: &DeviceSelection) -> Result<String, CameraError> {
        match selection {
            DeviceSelection::Exact(id) => self
                .devices
                .iter()
                .find(|d| &d.device_id == id)
                .map(|d| d.device_id.clone())
                .ok_or_else(|| CameraError::DeviceNotFound(id.clone())),
            DeviceSelection::Facing(mode) => Ok(self
                .devices
                .iter()
                .find(|d| mode.matches_label(&d.label))
                .or_else(|| self.devices.first())
                .map(|d| d.device_id.clone())
                // No enumerated devices: an anonymous default camera.
                .unwrap_or_else(|| "mock-default".to_string())),
        }
    }
}

impl Default for MockDevices {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MediaDevices for MockDevices {
    fn enumerate(&mut self) -> Result<Vec<CameraDevice>, CameraError> {
        if self.fail_enumerate {
            return Err(CameraError::EnumerationFailed("mock enumeration failure".into()));
        }
        Ok(self.devices.clone())
    }

    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn MediaStream>, CameraError> {
        if self.fail_open {
            return Err(CameraError::OpenFailed("permission denied".into()));
        }
        let device_id = self.select(&constraints.selection)?;
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(device = %device_id, "MockDevices opened stream");

        Ok(Box::new(MockStream {
            device_id,
            width: self.width,
            height: self.height,
            live: true,
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// Stream produced by [`MockDevices`].
#[derive(Debug)]
pub struct MockStream {
    device_id: String,
    width: u32,
    height: u32,
    live: bool,
    stats: Arc<MockStats>,
}

impl MediaStream for MockStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.live {
            return Err(CameraError::NotStreaming);
        }
        let sequence = self.stats.frames.fetch_add(1, Ordering::SeqCst) + 1;

        // Diagonal gradient shifted by the sequence number.
        let (w, h) = (self.width as u64, self.height as u64);
        let mut pixels = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let base = x + y + sequence * 37;
                pixels.push((base % 256) as u8);
                pixels.push(((base * 3) % 256) as u8);
                pixels.push(((sequence * 91) % 256) as u8);
            }
        }

        Ok(Frame::new(pixels, self.width, self.height, sequence))
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.stats.stopped.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(device = %self.device_id, "MockStream stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(selection: DeviceSelection) -> StreamConstraints {
        StreamConstraints {
            selection,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }

    #[test]
    fn test_mock_stream_lifecycle() {
        let mut devices = MockDevices::new(2);
        let stats = devices.stats();

        let mut stream = devices
            .open(&constraints(DeviceSelection::Exact("mock-0".into())))
            .unwrap();
        assert_eq!(stream.device_id(), "mock-0");
        assert!(stream.is_live());
        assert_eq!(stats.active(), 1);

        let first = stream.grab_frame().unwrap();
        let second = stream.grab_frame().unwrap();
        assert!(first.is_valid());
        assert_eq!(second.sequence(), first.sequence() + 1);
        assert_ne!(first.pixels(), second.pixels());

        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
        assert_eq!(stats.stopped(), 1);
        assert!(matches!(stream.grab_frame(), Err(CameraError::NotStreaming)));
    }

    #[test]
    fn test_facing_prefers_rear_camera() {
        let mut devices = MockDevices::new(3);
        let stream = devices
            .open(&constraints(DeviceSelection::Facing(FacingMode::Environment)))
            .unwrap();
        assert_eq!(stream.device_id(), "mock-2");

        let stream = devices
            .open(&constraints(DeviceSelection::Facing(FacingMode::User)))
            .unwrap();
        assert_eq!(stream.device_id(), "mock-0");
    }

    #[test]
    fn test_unknown_device() {
        let mut devices = MockDevices::new(1);
        assert!(matches!(
            devices.open(&constraints(DeviceSelection::Exact("nope".into()))),
            Err(CameraError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_failing_backend() {
        let mut devices = MockDevices::new(1).failing_enumeration();
        assert!(devices.enumerate().is_err());

        devices.set_fail_open(true);
        assert!(matches!(
            devices.open(&constraints(DeviceSelection::Facing(FacingMode::Environment))),
            Err(CameraError::OpenFailed(_))
        ));
    }

    #[test]
    fn test_facing_label_hints() {
        assert!(FacingMode::Environment.matches_label("HD Camera (Rear)"));
        assert!(FacingMode::User.matches_label("FaceTime HD Camera"));
        assert!(!FacingMode::Environment.matches_label("Integrated Webcam"));
    }
}
