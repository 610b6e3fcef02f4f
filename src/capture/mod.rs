//! Camera input and photo capture.
//!
//! This module owns the client half of the system: device enumeration,
//! stream lifecycle, still capture with JPEG encoding, and the state
//! machine that ties them to uploading.

mod camera;
mod config;
mod controller;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod photo;
mod stream;
mod uploader;

pub use camera::{
    CameraDevice, CameraError, DeviceKind, DeviceSelection, FacingMode, MediaDevices,
    MediaStream, MockDevices, MockStats, MockStream, StreamConstraints,
};
pub use config::CaptureConfig;
pub use controller::{CaptureController, CaptureError, CaptureState, StatusKind, StatusLine};
pub use frame::Frame;
#[cfg(feature = "camera")]
pub use native::{NativeDevices, NativeStream};
pub use photo::{encode_jpeg, CapturedPhoto, EncodeError, PHOTO_MIME_TYPE};
pub use stream::StreamGuard;
pub use uploader::{TransportError, Uploader};
