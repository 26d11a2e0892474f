//! Speedtest Exporter
//!
//! A long-running service that measures network performance (latency,
//! upload/download throughput) against a speedtest.net-compatible service
//! on a fixed interval and exposes the results as Prometheus metrics,
//! alongside liveness/readiness endpoints for orchestration platforms.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod runner;
pub mod server;

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{AppError, Result, ShutdownErrors};
pub use metrics::ExporterMetrics;
pub use provider::{SpeedtestProvider, SpeedtestServer, UserInfo};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TEST_INTERVAL: Duration = Duration::from_secs(30);
    pub const DEFAULT_HEALTH_PORT: u16 = 8080;
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// How long shutdown waits for in-flight work before forcing closure.
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

    /// Prometheus namespace prefixed onto every exported metric.
    pub const METRICS_NAMESPACE: &str = "speedtest_exporter";
}
