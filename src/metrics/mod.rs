//! Prometheus metrics for the upload endpoint.
//!
//! # Metrics Exposed
//!
//! - `photo_booth_uploads_accepted_total` - Photos accepted and stored
//! - `photo_booth_uploads_rejected_total{reason}` - Refused uploads, labelled
//!   with [`UploadError::reason`](crate::upload::UploadError::reason)
//! - `photo_booth_bytes_stored_total` - Bytes written to the upload directory
//!
//! When the `server` feature is enabled they are served at `GET /metrics`.

mod collector;

pub use collector::{MetricsError, UploadMetrics};
