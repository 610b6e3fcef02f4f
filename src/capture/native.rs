//! Hardware cameras through `nokhwa`.

use super::{
    CameraDevice, CameraError, DeviceSelection, FacingMode, Frame, MediaDevices, MediaStream,
    StreamConstraints,
};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
    Camera,
};

const PREFERRED_FPS: u32 = 30;

/// Cameras exposed by the platform's native capture API.
#[derive(Debug, Clone, Copy)]
pub struct NativeDevices {
    backend: ApiBackend,
}

impl NativeDevices {
    /// Uses the platform's default capture backend.
    pub fn new() -> Self {
        Self {
            backend: ApiBackend::Auto,
        }
    }

    fn facing_index(&mut self, mode: FacingMode) -> Result<CameraIndex, CameraError> {
        let devices = self.enumerate()?;
        devices
            .iter()
            .find(|d| mode.matches_label(&d.label))
            .or_else(|| devices.first())
            .map(|d| parse_index(&d.device_id))
            .ok_or_else(|| CameraError::DeviceNotFound("no camera available".into()))
    }
}

impl Default for NativeDevices {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric ids map to indices, everything else to a backend path/name.
fn parse_index(id: &str) -> CameraIndex {
    id.parse::<u32>()
        .map(CameraIndex::Index)
        .unwrap_or_else(|_| CameraIndex::String(id.to_string()))
}

impl MediaDevices for NativeDevices {
    fn enumerate(&mut self) -> Result<Vec<CameraDevice>, CameraError> {
        let cameras = nokhwa::query(self.backend)
            .map_err(|e| CameraError::EnumerationFailed(e.to_string()))?;

        Ok(cameras
            .iter()
            .map(|info| CameraDevice::video(info.index().to_string(), info.human_name()))
            .collect())
    }

    fn open(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn MediaStream>, CameraError> {
        let index = match &constraints.selection {
            DeviceSelection::Exact(id) => parse_index(id),
            DeviceSelection::Facing(mode) => self.facing_index(*mode)?,
        };

        let preferred = CameraFormat::new(
            Resolution::new(constraints.ideal_width, constraints.ideal_height),
            FrameFormat::MJPEG,
            PREFERRED_FPS,
        );
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(preferred));

        let mut camera = Camera::new(index.clone(), requested)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        tracing::info!(
            device = %index,
            resolution = %camera.resolution(),
            "Native camera stream opened"
        );

        Ok(Box::new(NativeStream {
            device_id: index.to_string(),
            camera,
            live: true,
            sequence: 0,
        }))
    }
}

/// A running `nokhwa` camera.
pub struct NativeStream {
    device_id: String,
    camera: Camera,
    live: bool,
    sequence: u64,
}

impl MediaStream for NativeStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.live {
            return Err(CameraError::NotStreaming);
        }
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        self.sequence += 1;
        let (width, height) = (decoded.width(), decoded.height());
        Ok(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(device = %self.device_id, error = %e, "Failed to stop camera stream");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("2"), CameraIndex::Index(2));
        assert_eq!(
            parse_index("/dev/video0"),
            CameraIndex::String("/dev/video0".into())
        );
    }
}
