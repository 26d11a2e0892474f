//! Prometheus metrics registry for speed test results
//!
//! One counter and four gauges, registered once at startup and shared by the
//! runner loop (writes) and the scrape handler (reads). The prometheus crate's
//! instruments are internally atomic, so no external locking is needed for
//! concurrent update and scrape.

use crate::defaults::METRICS_NAMESPACE;
use crate::error::{AppError, Result, ShutdownErrors};
use prometheus::{Encoder, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Label names applied to the per-measurement gauges
const MEASUREMENT_LABELS: &[&str] = &["user_info", "server_host"];

/// Label values describing the target of the most recent measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementLabels {
    /// Identifying user/network info reported by the provider
    pub user_info: String,
    /// Host of the selected speed test server
    pub server_host: String,
}

impl MeasurementLabels {
    fn values(&self) -> [&str; 2] {
        [&self.user_info, &self.server_host]
    }
}

/// The exporter's metric instruments
///
/// Cloning is cheap and shares the underlying registry, so one instance is
/// created at startup and handed to both the runner loop and the HTTP server.
#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,
    test_count: IntCounter,
    test_status: IntGauge,
    latency: GaugeVec,
    upload_speed: GaugeVec,
    download_speed: GaugeVec,
}

impl ExporterMetrics {
    /// Create and register every instrument
    ///
    /// Registration failure on any instrument is fatal to startup; the error
    /// names the instrument that failed.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let test_count = IntCounter::with_opts(
            Opts::new("test_count", "The number of tests run").namespace(METRICS_NAMESPACE),
        )
        .map_err(|e| AppError::metrics(format!("failed to create test_count: {}", e)))?;

        let test_status = IntGauge::with_opts(
            Opts::new("test_status", "The status of a test. 0 == failed. 1 == success")
                .namespace(METRICS_NAMESPACE),
        )
        .map_err(|e| AppError::metrics(format!("failed to create test_status: {}", e)))?;

        let latency = GaugeVec::new(
            Opts::new("latency", "The latency to the server in seconds")
                .namespace(METRICS_NAMESPACE),
            MEASUREMENT_LABELS,
        )
        .map_err(|e| AppError::metrics(format!("failed to create latency: {}", e)))?;

        let upload_speed = GaugeVec::new(
            Opts::new("upload_speed", "The speed of the upload in bits per second")
                .namespace(METRICS_NAMESPACE),
            MEASUREMENT_LABELS,
        )
        .map_err(|e| AppError::metrics(format!("failed to create upload_speed: {}", e)))?;

        let download_speed = GaugeVec::new(
            Opts::new("download_speed", "The speed of the download in bits per second")
                .namespace(METRICS_NAMESPACE),
            MEASUREMENT_LABELS,
        )
        .map_err(|e| AppError::metrics(format!("failed to create download_speed: {}", e)))?;

        for (name, collector) in [
            ("test_count", Box::new(test_count.clone()) as Box<dyn prometheus::core::Collector>),
            ("test_status", Box::new(test_status.clone())),
            ("latency", Box::new(latency.clone())),
            ("upload_speed", Box::new(upload_speed.clone())),
            ("download_speed", Box::new(download_speed.clone())),
        ] {
            registry
                .register(collector)
                .map_err(|e| AppError::metrics(format!("failed to register {}: {}", name, e)))?;
        }

        Ok(Self {
            registry,
            test_count,
            test_status,
            latency,
            upload_speed,
            download_speed,
        })
    }

    /// Increment the cycle attempt counter
    ///
    /// Called once at the start of every cycle, success or failure.
    pub fn record_attempt(&self) {
        self.test_count.inc();
    }

    /// Record the aggregate outcome of the most recently completed cycle
    pub fn record_status(&self, success: bool) {
        self.test_status.set(if success { 1 } else { 0 });
    }

    /// Record a successful ping measurement, in seconds
    pub fn record_latency(&self, labels: &MeasurementLabels, seconds: f64) {
        self.latency.with_label_values(&labels.values()).set(seconds);
    }

    /// Record a successful upload measurement, in bits per second
    pub fn record_upload(&self, labels: &MeasurementLabels, bits_per_second: f64) {
        self.upload_speed
            .with_label_values(&labels.values())
            .set(bits_per_second);
    }

    /// Record a successful download measurement, in bits per second
    pub fn record_download(&self, labels: &MeasurementLabels, bits_per_second: f64) {
        self.download_speed
            .with_label_values(&labels.values())
            .set(bits_per_second);
    }

    /// Render every registered instrument in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| AppError::metrics(format!("failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| AppError::metrics(format!("metrics output was not valid UTF-8: {}", e)))
    }

    /// Release the registry: unregister every collector
    ///
    /// Every unregister is attempted regardless of earlier failures and all
    /// errors are aggregated.
    pub fn shutdown(&self) -> std::result::Result<(), ShutdownErrors> {
        let mut errors = ShutdownErrors::new();

        let collectors: [(&'static str, Box<dyn prometheus::core::Collector>); 5] = [
            ("unregister test_count", Box::new(self.test_count.clone())),
            ("unregister test_status", Box::new(self.test_status.clone())),
            ("unregister latency", Box::new(self.latency.clone())),
            ("unregister upload_speed", Box::new(self.upload_speed.clone())),
            ("unregister download_speed", Box::new(self.download_speed.clone())),
        ];

        for (step, collector) in collectors {
            errors.record(
                step,
                self.registry
                    .unregister(collector)
                    .map_err(|e| AppError::metrics(e.to_string())),
            );
        }

        errors.into_result()
    }

    #[cfg(test)]
    pub(crate) fn test_count_value(&self) -> u64 {
        self.test_count.get()
    }

    #[cfg(test)]
    pub(crate) fn test_status_value(&self) -> i64 {
        self.test_status.get()
    }
}
