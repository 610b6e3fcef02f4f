//! Capture state machine.
//!
//! ```text
//!            start_stream          capture
//!   Idle ───────────────▶ Streaming ───────▶ Captured ──upload──▶ Uploading
//!    ▲                      │  ▲  ▲             │                     │
//!    └── switch failure ────┘  │  └── retake ───┘                     │
//!                              │                  ◀── any outcome ────┘
//!                          switch_camera
//! ```
//!
//! All session state (device list, selected device, live stream, pending
//! photo, tag, status line) lives in one [`CaptureController`]. At most
//! one stream is open at a time; it is held by a [`StreamGuard`] so every
//! path that ends it releases the device.

use super::{
    CameraDevice, CameraError, CaptureConfig, CapturedPhoto, DeviceKind, DeviceSelection,
    EncodeError, Frame, MediaDevices, StreamConstraints, StreamGuard, TransportError, Uploader,
};
use crate::tag::{RenderedTag, TagCode};
use crate::upload::UploadResult;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No stream open.
    Idle,
    /// Live preview running.
    Streaming,
    /// A photo is held, the camera is released.
    Captured,
    /// An upload is in flight.
    Uploading,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaptureState::Idle => "idle",
            CaptureState::Streaming => "streaming",
            CaptureState::Captured => "captured",
            CaptureState::Uploading => "uploading",
        })
    }
}

/// Errors surfaced by controller operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The camera could not be opened or read.
    #[error("error accessing the camera: {0}")]
    MediaAccess(#[source] CameraError),
    /// The next camera could not be opened.
    #[error("error switching camera: {0}")]
    MediaSwitch(#[source] CameraError),
    /// The operation is not valid in the current state.
    #[error("cannot {op} while {state}")]
    InvalidState {
        /// The refused operation.
        op: &'static str,
        /// State the controller was in.
        state: CaptureState,
    },
    /// Fewer than two cameras are known.
    #[error("no other camera to switch to")]
    NoAlternateDevice,
    /// No photo has been captured.
    #[error("no photo to upload")]
    NoPhoto,
    /// The frame could not be encoded.
    #[error("failed to encode photo: {0}")]
    Encode(#[from] EncodeError),
    /// The upload request did not complete.
    #[error("upload failed: {0}")]
    UploadTransport(#[source] TransportError),
    /// The server refused the photo.
    #[error("upload rejected: {0}")]
    UploadRejected(String),
}

/// Presentation of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Neutral progress message.
    Info,
    /// Completed upload.
    Success,
    /// Failure.
    Error,
}

/// The single user-facing status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Presentation.
    pub kind: StatusKind,
    /// Message shown to the user.
    pub text: String,
}

impl StatusLine {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Whether the line reports a failure.
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

const STREAMING_HINT: &str = "Camera active. Press capture to take a photo.";

/// Owns the camera lifecycle and the captured photo for one session.
pub struct CaptureController<D: MediaDevices> {
    media: D,
    config: CaptureConfig,
    state: CaptureState,
    devices: Vec<CameraDevice>,
    current_index: usize,
    stream: Option<StreamGuard>,
    photo: Option<CapturedPhoto>,
    tag: Option<RenderedTag>,
    status: StatusLine,
}

impl<D: MediaDevices> CaptureController<D> {
    /// Creates an idle controller.
    pub fn new(media: D, config: CaptureConfig) -> Self {
        Self {
            media,
            config,
            state: CaptureState::Idle,
            devices: Vec::new(),
            current_index: 0,
            stream: None,
            photo: None,
            tag: None,
            status: StatusLine::new(StatusKind::Info, "Press start to activate the camera."),
        }
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Current status line.
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Cameras found by the last enumeration.
    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    /// Index of the selected camera in [`devices`](Self::devices).
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The selected device, if any were enumerated.
    pub fn current_device(&self) -> Option<&CameraDevice> {
        self.devices.get(self.current_index)
    }

    /// Device id of the live stream.
    pub fn streaming_device(&self) -> Option<&str> {
        self.stream.as_ref().map(StreamGuard::device_id)
    }

    /// The captured photo, if any.
    pub fn photo(&self) -> Option<&CapturedPhoto> {
        self.photo.as_ref()
    }

    /// The tag currently on display.
    pub fn tag(&self) -> Option<&RenderedTag> {
        self.tag.as_ref()
    }

    /// The device backend.
    pub fn media(&self) -> &D {
        &self.media
    }

    /// Enumerates video inputs.
    ///
    /// A failure is logged and leaves the list empty; streaming still
    /// works through the default device.
    pub fn list_devices(&mut self) -> &[CameraDevice] {
        match self.media.enumerate() {
            Ok(found) => {
                self.devices = found
                    .into_iter()
                    .filter(|d| d.kind == DeviceKind::VideoInput)
                    .collect();
                info!(count = self.devices.len(), "Cameras enumerated");
            }
            Err(err) => {
                warn!(error = %err, "Failed to enumerate cameras");
                self.devices.clear();
            }
        }
        self.current_index = 0;
        &self.devices
    }

    /// Opens a stream, on `device_id` exactly or on the configured facing.
    pub fn start_stream(&mut self, device_id: Option<&str>) -> Result<(), CaptureError> {
        self.require(CaptureState::Idle, "start the camera")?;

        match self.open_stream(device_id) {
            Ok(guard) => {
                self.stream = Some(guard);
                self.state = CaptureState::Streaming;
                self.set_status(StatusKind::Info, STREAMING_HINT);
                Ok(())
            }
            Err(err) => {
                self.set_status(
                    StatusKind::Error,
                    format!("Error accessing the camera: {err}"),
                );
                Err(CaptureError::MediaAccess(err))
            }
        }
    }

    /// Moves to the next enumerated camera, wrapping around.
    ///
    /// The old stream is stopped before the new one is requested; if the
    /// new one cannot be opened the controller is left `Idle`.
    pub fn switch_camera(&mut self) -> Result<(), CaptureError> {
        self.require(CaptureState::Streaming, "switch camera")?;
        if self.devices.len() < 2 {
            self.set_status(StatusKind::Error, "No other camera available.");
            return Err(CaptureError::NoAlternateDevice);
        }

        if let Some(old) = self.stream.take() {
            old.release();
        }
        let total = self.devices.len();
        self.current_index = (self.current_index + 1) % total;
        let device_id = self.devices[self.current_index].device_id.clone();

        match self.open_stream(Some(&device_id)) {
            Ok(guard) => {
                self.stream = Some(guard);
                self.set_status(
                    StatusKind::Info,
                    format!("Switched to camera {} of {}", self.current_index + 1, total),
                );
                Ok(())
            }
            Err(err) => {
                self.state = CaptureState::Idle;
                self.set_status(StatusKind::Error, format!("Error switching camera: {err}"));
                Err(CaptureError::MediaSwitch(err))
            }
        }
    }

    /// Grabs a live frame without capturing it.
    pub fn preview(&mut self) -> Result<Frame, CaptureError> {
        self.require(CaptureState::Streaming, "preview")?;
        let stream = self
            .stream
            .as_mut()
            .ok_or(CaptureError::MediaAccess(CameraError::NotStreaming))?;
        stream.grab_frame().map_err(CaptureError::MediaAccess)
    }

    /// Captures a photo tagged with the current local time.
    pub fn capture(&mut self) -> Result<&CapturedPhoto, CaptureError> {
        self.capture_at(Local::now().naive_local())
    }

    /// Captures a photo tagged with `now`.
    ///
    /// The frame is encoded at native resolution, the stream is released,
    /// and the tag is rendered for display.
    pub fn capture_at(&mut self, now: NaiveDateTime) -> Result<&CapturedPhoto, CaptureError> {
        self.require(CaptureState::Streaming, "capture")?;
        let frame = match self.stream.as_mut().map(StreamGuard::grab_frame) {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                self.set_status(StatusKind::Error, format!("Error capturing photo: {err}"));
                return Err(CaptureError::MediaAccess(err));
            }
            None => return Err(CaptureError::MediaAccess(CameraError::NotStreaming)),
        };

        let tag = TagCode::from_datetime(&now);
        let photo = match CapturedPhoto::encode(&frame, self.config.jpeg_quality, tag.clone()) {
            Ok(photo) => photo,
            Err(err) => {
                self.set_status(StatusKind::Error, format!("Error capturing photo: {err}"));
                return Err(err.into());
            }
        };

        if let Some(stream) = self.stream.take() {
            stream.release();
        }

        self.tag = match RenderedTag::render(tag, &self.config.tag) {
            Ok(rendered) => Some(rendered),
            Err(err) => {
                warn!(error = %err, "Failed to render tag");
                None
            }
        };

        info!(
            tag = %photo.tag,
            width = photo.width,
            height = photo.height,
            bytes = photo.len(),
            "Photo captured"
        );
        self.state = CaptureState::Captured;
        self.set_status(
            StatusKind::Info,
            "Photo captured. Upload it or take it again.",
        );
        Ok(self.photo.insert(photo))
    }

    /// Discards the photo and reopens the previously selected camera.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.require(CaptureState::Captured, "retake")?;

        self.photo = None;
        self.tag = None;

        let device_id = self.current_device().map(|d| d.device_id.clone());
        match self.open_stream(device_id.as_deref()) {
            Ok(guard) => {
                self.stream = Some(guard);
                self.state = CaptureState::Streaming;
                self.set_status(StatusKind::Info, STREAMING_HINT);
                Ok(())
            }
            Err(err) => {
                self.state = CaptureState::Idle;
                self.set_status(
                    StatusKind::Error,
                    format!("Error reactivating the camera: {err}"),
                );
                Err(CaptureError::MediaAccess(err))
            }
        }
    }

    /// Sends the captured photo and reports the outcome.
    ///
    /// Returns to `Captured` whatever happens, so the same photo can be
    /// sent again.
    pub async fn upload<U: Uploader>(&mut self, uploader: &U) -> Result<UploadResult, CaptureError> {
        self.require(CaptureState::Captured, "upload")?;
        let Some(photo) = self.photo.clone() else {
            self.set_status(StatusKind::Error, "No photo to upload.");
            return Err(CaptureError::NoPhoto);
        };

        self.set_status(StatusKind::Info, "Uploading photo...");
        let outcome = {
            let _uploading = UploadingGuard::enter(&mut self.state);
            uploader.upload(&photo).await
        };

        match outcome {
            Ok(result) if result.success => {
                info!(filepath = %result.filepath, tag = %photo.tag, "Photo uploaded");
                self.set_status(
                    StatusKind::Success,
                    format!("Photo uploaded: {}", result.filepath),
                );
                Ok(result)
            }
            Ok(result) => {
                warn!(error = %result.error, "Upload rejected by server");
                self.set_status(StatusKind::Error, format!("Upload failed: {}", result.error));
                Err(CaptureError::UploadRejected(result.error))
            }
            Err(err) => {
                warn!(error = %err, "Upload transport failure");
                self.set_status(StatusKind::Error, format!("Upload failed: {err}"));
                Err(CaptureError::UploadTransport(err))
            }
        }
    }

    /// Releases the camera. Also runs on drop.
    pub fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.release();
        }
        if self.state == CaptureState::Streaming {
            self.state = CaptureState::Idle;
        }
    }

    fn open_stream(&mut self, device_id: Option<&str>) -> Result<StreamGuard, CameraError> {
        debug_assert!(self.stream.is_none(), "a stream is already open");

        let selection = match device_id {
            Some(id) => DeviceSelection::Exact(id.to_string()),
            None => DeviceSelection::Facing(self.config.facing),
        };
        let constraints = StreamConstraints {
            selection,
            ideal_width: self.config.ideal_width,
            ideal_height: self.config.ideal_height,
        };

        let guard = StreamGuard::new(self.media.open(&constraints)?);
        if let Some(index) = self
            .devices
            .iter()
            .position(|d| d.device_id == guard.device_id())
        {
            self.current_index = index;
        }
        info!(device = %guard.device_id(), "Camera stream started");
        Ok(guard)
    }

    fn require(&self, expected: CaptureState, op: &'static str) -> Result<(), CaptureError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CaptureError::InvalidState {
                op,
                state: self.state,
            })
        }
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = StatusLine::new(kind, text);
    }
}

/// Holds the controller in `Uploading` and puts it back to `Captured`
/// when dropped, including when the upload future is cancelled.
struct UploadingGuard<'a>(&'a mut CaptureState);

impl<'a> UploadingGuard<'a> {
    fn enter(state: &'a mut CaptureState) -> Self {
        *state = CaptureState::Uploading;
        Self(state)
    }
}

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = CaptureState::Captured;
    }
}

impl<D: MediaDevices> Drop for CaptureController<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockDevices;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records what it was asked to send and answers with a canned result.
    struct RecordingUploader {
        sent: Mutex<Vec<Vec<u8>>>,
        reply: Result<UploadResult, String>,
    }

    impl RecordingUploader {
        fn accepting() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                reply: Ok(UploadResult::stored("uploads/img_test.jpg")),
            }
        }

        fn replying(reply: Result<UploadResult, String>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Uploader for RecordingUploader {
        async fn upload(&self, photo: &CapturedPhoto) -> Result<UploadResult, TransportError> {
            self.sent.lock().unwrap().push(photo.encoded_image.to_vec());
            self.reply.clone().map_err(TransportError::Request)
        }
    }

    fn controller(devices: usize) -> CaptureController<MockDevices> {
        let mut controller = CaptureController::new(MockDevices::new(devices), CaptureConfig::default());
        controller.list_devices();
        controller
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 5)
            .unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let mut c = controller(1);
        let stats = c.media().stats();
        assert_eq!(c.state(), CaptureState::Idle);

        c.start_stream(None).unwrap();
        assert_eq!(c.state(), CaptureState::Streaming);
        assert_eq!(stats.active(), 1);

        let photo = c.capture_at(noon()).unwrap();
        assert_eq!(photo.tag.as_str(), "IMG_20240601_120005");
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(c.state(), CaptureState::Captured);
        assert_eq!(stats.active(), 0);
        assert_eq!(c.tag().unwrap().code.as_str(), "IMG_20240601_120005");
        assert!(c.tag().unwrap().svg.contains("<svg"));
    }

    #[test]
    fn test_capture_keeps_native_resolution() {
        let mut c = CaptureController::new(
            MockDevices::new(1).with_resolution(320, 240),
            CaptureConfig::default(),
        );
        c.start_stream(None).unwrap();

        let photo = c.capture().unwrap();
        assert_eq!((photo.width, photo.height), (320, 240));
        let decoded = image::load_from_memory(&photo.encoded_image).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_enumeration_failure_leaves_list_empty() {
        let mut c = CaptureController::new(
            MockDevices::new(2).failing_enumeration(),
            CaptureConfig::default(),
        );
        assert!(c.list_devices().is_empty());

        // The default device still works.
        c.start_stream(None).unwrap();
        assert_eq!(c.state(), CaptureState::Streaming);
    }

    #[test]
    fn test_start_failure_reports_media_access() {
        let mut devices = MockDevices::new(1);
        devices.set_fail_open(true);
        let mut c = CaptureController::new(devices, CaptureConfig::default());

        let err = c.start_stream(None).unwrap_err();
        assert!(matches!(err, CaptureError::MediaAccess(_)));
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.status().is_error());
        assert!(c.status().text.starts_with("Error accessing the camera"));
    }

    #[test]
    fn test_start_with_device_selects_index() {
        let mut c = controller(3);
        c.start_stream(Some("mock-1")).unwrap();
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.streaming_device(), Some("mock-1"));
    }

    #[test]
    fn test_facing_default_syncs_index() {
        let mut c = controller(2);
        c.start_stream(None).unwrap();
        assert_eq!(c.streaming_device(), Some("mock-1"));
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn test_switch_alternates_between_two_devices() {
        let mut c = controller(2);
        let stats = c.media().stats();
        c.start_stream(Some("mock-0")).unwrap();
        assert_eq!(c.current_index(), 0);

        c.switch_camera().unwrap();
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.streaming_device(), Some("mock-1"));
        assert_eq!(c.status().text, "Switched to camera 2 of 2");

        c.switch_camera().unwrap();
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.streaming_device(), Some("mock-0"));
        assert_eq!(stats.active(), 1);
    }

    #[test]
    fn test_switch_needs_two_devices() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        assert!(matches!(
            c.switch_camera(),
            Err(CaptureError::NoAlternateDevice)
        ));
        assert_eq!(c.state(), CaptureState::Streaming);
    }

    #[test]
    fn test_switch_only_while_streaming() {
        let mut c = controller(2);
        assert!(matches!(
            c.switch_camera(),
            Err(CaptureError::InvalidState { state: CaptureState::Idle, .. })
        ));
    }

    #[test]
    fn test_failed_switch_goes_idle() {
        let mut c = CaptureController::new(MockDevices::new(2), CaptureConfig::default());
        c.list_devices();
        c.start_stream(Some("mock-0")).unwrap();

        // Reach into the backend to make the next open fail.
        c.media.set_fail_open(true);
        let err = c.switch_camera().unwrap_err();

        assert!(matches!(err, CaptureError::MediaSwitch(_)));
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.streaming_device().is_none());
        assert_eq!(c.media().stats().active(), 0);

        c.media.set_fail_open(false);
        c.start_stream(None).unwrap();
        assert_eq!(c.state(), CaptureState::Streaming);
    }

    #[test]
    fn test_preview_keeps_streaming() {
        let mut c = controller(1);
        assert!(c.preview().is_err());

        c.start_stream(None).unwrap();
        let a = c.preview().unwrap();
        let b = c.preview().unwrap();
        assert!(b.sequence() > a.sequence());
        assert_eq!(c.state(), CaptureState::Streaming);
    }

    #[test]
    fn test_capture_only_while_streaming() {
        let mut c = controller(1);
        assert!(matches!(
            c.capture(),
            Err(CaptureError::InvalidState { op: "capture", .. })
        ));
    }

    #[test]
    fn test_retake_reopens_selected_device() {
        let mut c = controller(2);
        c.start_stream(Some("mock-0")).unwrap();
        c.capture_at(noon()).unwrap();

        c.retake().unwrap();
        assert_eq!(c.state(), CaptureState::Streaming);
        assert_eq!(c.streaming_device(), Some("mock-0"));
        assert!(c.photo().is_none());
        assert!(c.tag().is_none());
    }

    #[test]
    fn test_retake_failure_goes_idle() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        c.capture_at(noon()).unwrap();

        c.media.set_fail_open(true);
        assert!(matches!(c.retake(), Err(CaptureError::MediaAccess(_))));
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.photo().is_none());
    }

    #[tokio::test]
    async fn test_retake_replaces_photo_before_upload() {
        let mut c = controller(1);
        let uploader = RecordingUploader::accepting();

        c.start_stream(None).unwrap();
        let first = c.capture_at(noon()).unwrap().encoded_image.clone();
        c.retake().unwrap();
        let second = c.capture().unwrap().encoded_image.clone();
        assert_ne!(first, second);

        c.upload(&uploader).await.unwrap();
        assert_eq!(uploader.sent(), vec![second.to_vec()]);
    }

    #[tokio::test]
    async fn test_upload_success_reports_path() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        c.capture().unwrap();

        let result = c.upload(&RecordingUploader::accepting()).await.unwrap();
        assert!(result.success);
        assert_eq!(c.state(), CaptureState::Captured);
        assert_eq!(c.status().kind, StatusKind::Success);
        assert_eq!(c.status().text, "Photo uploaded: uploads/img_test.jpg");
    }

    #[tokio::test]
    async fn test_upload_rejection_returns_to_captured() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        c.capture().unwrap();

        let rejected = UploadResult {
            success: false,
            error: "File is too large".into(),
            filepath: String::new(),
        };
        let err = c
            .upload(&RecordingUploader::replying(Ok(rejected)))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::UploadRejected(ref msg) if msg == "File is too large"));
        assert_eq!(c.state(), CaptureState::Captured);
        assert_eq!(c.status().text, "Upload failed: File is too large");
        assert!(c.photo().is_some());
    }

    #[tokio::test]
    async fn test_upload_transport_failure() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        c.capture().unwrap();

        let err = c
            .upload(&RecordingUploader::replying(Err("connection refused".into())))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::UploadTransport(_)));
        assert_eq!(c.state(), CaptureState::Captured);
        assert!(c.status().is_error());
    }

    /// Never answers.
    struct StalledUploader;

    impl Uploader for StalledUploader {
        async fn upload(&self, _photo: &CapturedPhoto) -> Result<UploadResult, TransportError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancelled_upload_returns_to_captured() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        c.capture().unwrap();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), c.upload(&StalledUploader)).await;
        assert!(timed_out.is_err());
        assert_eq!(c.state(), CaptureState::Captured);
        assert!(c.photo().is_some());

        let uploader = RecordingUploader::accepting();
        c.upload(&uploader).await.unwrap();
        assert_eq!(uploader.sent().len(), 1);
        c.retake().unwrap();
        assert_eq!(c.state(), CaptureState::Streaming);
    }

    #[tokio::test]
    async fn test_upload_requires_capture() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        let uploader = RecordingUploader::accepting();

        assert!(matches!(
            c.upload(&uploader).await,
            Err(CaptureError::InvalidState { op: "upload", .. })
        ));
        assert!(uploader.sent().is_empty());
    }

    #[test]
    fn test_drop_releases_stream() {
        let devices = MockDevices::new(1);
        let stats = devices.stats();
        {
            let mut c = CaptureController::new(devices, CaptureConfig::default());
            c.start_stream(None).unwrap();
            assert_eq!(stats.active(), 1);
        }
        assert_eq!(stats.active(), 0);
    }

    #[test]
    fn test_shutdown_returns_to_idle() {
        let mut c = controller(1);
        c.start_stream(None).unwrap();
        c.shutdown();
        assert_eq!(c.state(), CaptureState::Idle);
        assert_eq!(c.media().stats().active(), 0);
    }
}
