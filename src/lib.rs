//! Photo Booth Library
//!
//! Camera capture with QR timestamp tags, and a validating upload
//! endpoint that stores the resulting photos on disk.
//!
//! # Architecture
//!
//! Two halves meet over one multipart POST:
//!
//! ```text
//! capture (MediaDevices → StreamGuard → CapturedPhoto) ─┐
//!     tag (TagCode → QR)                                │ client::HttpUploader
//!                                                       ▼
//!                        server (axum) → upload (sniff → size → store)
//!                                                       │
//!                               {"success","error","filepath"} JSON
//! ```
//!
//! # Example
//!
//! ```no_run
//! use photo_booth::{
//!     capture::{CaptureConfig, CaptureController, MockDevices},
//!     client::HttpUploader,
//! };
//!
//! # async fn run() -> Result<(), photo_booth::capture::CaptureError> {
//! let mut controller = CaptureController::new(MockDevices::new(2), CaptureConfig::default());
//! controller.list_devices();
//! controller.start_stream(None)?;
//!
//! let photo = controller.capture()?;
//! println!("captured {} ({} bytes)", photo.tag, photo.len());
//!
//! let uploader = HttpUploader::new("http://localhost:8080/backend/upload");
//! let result = controller.upload(&uploader).await?;
//! println!("stored at {}", result.filepath);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod metrics;
#[cfg(feature = "server")]
pub mod server;
pub mod tag;
pub mod upload;

// Re-export commonly used types at crate root
pub use capture::{CaptureConfig, CaptureController, CaptureState, CapturedPhoto, MockDevices};
pub use config::{ConfigError, FileConfig, ServerConfig, UploadConfig};
pub use tag::TagCode;
pub use upload::{sniff, UploadError, UploadResult, UploadService};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
