//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus registry for upload monitoring.
#[derive(Clone)]
pub struct UploadMetrics {
    registry: Registry,
    accepted_total: IntCounter,
    rejected_total: IntCounterVec,
    bytes_stored_total: IntCounter,
}

impl UploadMetrics {
    /// Creates a new registry with all upload metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let accepted_total = IntCounter::new(
            "photo_booth_uploads_accepted_total",
            "Total number of photos accepted and stored",
        )?;
        let rejected_total = IntCounterVec::new(
            Opts::new(
                "photo_booth_uploads_rejected_total",
                "Total number of uploads refused, by reason",
            ),
            &["reason"],
        )?;
        let bytes_stored_total = IntCounter::new(
            "photo_booth_bytes_stored_total",
            "Total bytes written to the upload directory",
        )?;

        registry.register(Box::new(accepted_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(bytes_stored_total.clone()))?;

        Ok(Self {
            registry,
            accepted_total,
            rejected_total,
            bytes_stored_total,
        })
    }

    /// Records a stored photo of `size` bytes.
    pub fn record_accepted(&self, size: u64) {
        self.accepted_total.inc();
        self.bytes_stored_total.inc_by(size);
    }

    /// Records a refused upload.
    pub fn record_rejected(&self, reason: &str) {
        self.rejected_total.with_label_values(&[reason]).inc();
    }

    /// Number of stored uploads.
    pub fn accepted(&self) -> u64 {
        self.accepted_total.get()
    }

    /// Number of refused uploads for `reason`.
    pub fn rejected(&self, reason: &str) -> u64 {
        self.rejected_total.with_label_values(&[reason]).get()
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for UploadMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadMetrics")
            .field("accepted", &self.accepted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        assert!(UploadMetrics::new().is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let metrics = UploadMetrics::new().unwrap();

        metrics.record_accepted(1000);
        metrics.record_accepted(24);
        metrics.record_rejected("payload_too_large");

        assert_eq!(metrics.accepted(), 2);
        assert_eq!(metrics.rejected("payload_too_large"), 1);

        let output = metrics.encode().unwrap();
        assert!(output.contains("photo_booth_uploads_accepted_total 2"));
        assert!(output.contains("photo_booth_bytes_stored_total 1024"));
        assert!(output.contains(r#"photo_booth_uploads_rejected_total{reason="payload_too_large"} 1"#));
    }

    #[test]
    fn test_metrics_encode() {
        let output = UploadMetrics::new().unwrap().encode().unwrap();
        assert!(output.contains("photo_booth_uploads_accepted_total"));
        assert!(output.contains("photo_booth_bytes_stored_total"));
    }
}
