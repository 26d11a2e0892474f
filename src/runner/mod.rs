//! Runner orchestration: metrics, server, and the interval loop
//!
//! `start` wires the long-lived pieces together and returns a handle whose
//! `shutdown` joins the loop task and tears the pieces down in order,
//! running every step regardless of earlier failures.

pub mod cycle;

pub use cycle::run_cycle;

use crate::config::RunConfig;
use crate::error::{AppError, Result, ShutdownErrors};
use crate::metrics::ExporterMetrics;
use crate::provider::SpeedtestProvider;
use crate::server::{self, HealthServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Handle to the running exporter
///
/// Cancellation of the token passed to [`start`] is the only control
/// signal for the loop; this handle exists so shutdown can join the loop
/// task and guarantee no iteration is silently abandoned.
pub struct RunnerHandle {
    loop_handle: JoinHandle<()>,
    server: HealthServer,
    metrics: ExporterMetrics,
}

/// Start the exporter: metrics registry, health/metrics server, test loop
pub async fn start(
    token: CancellationToken,
    config: RunConfig,
    provider: Arc<dyn SpeedtestProvider>,
) -> Result<RunnerHandle> {
    config.validate()?;

    let metrics = ExporterMetrics::new()?;
    let server = server::start(metrics.clone(), config.health_port).await?;
    let loop_handle = start_test_loop(token, config.test_interval, provider, metrics.clone());

    Ok(RunnerHandle {
        loop_handle,
        server,
        metrics,
    })
}

impl RunnerHandle {
    /// The address the health/metrics listener is bound to
    pub fn server_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// The shared metric instruments
    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Tear everything down, each step bounded by `grace`
    ///
    /// Joins the loop task (aborting it if it does not stop in time, which
    /// only happens when the driving token was never cancelled or a cycle
    /// outlives the grace period), drains the HTTP server, and releases the
    /// metrics registry. Every step runs; failures aggregate.
    pub async fn shutdown(self, grace: Duration) -> std::result::Result<(), ShutdownErrors> {
        let mut errors = ShutdownErrors::new();

        let mut loop_handle = self.loop_handle;
        match tokio::time::timeout(grace, &mut loop_handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                errors.push(
                    "test loop join",
                    AppError::internal(format!("test loop task failed: {}", e)),
                );
            }
            Err(_) => {
                loop_handle.abort();
                errors.push(
                    "test loop join",
                    AppError::internal(format!("test loop did not stop within {:?}", grace)),
                );
            }
        }

        if let Err(server_errors) = self.server.shutdown(grace).await {
            errors.extend(server_errors);
        }

        if let Err(metrics_errors) = self.metrics.shutdown() {
            errors.extend(metrics_errors);
        }

        errors.into_result()
    }
}

/// Sleep needed before the next iteration: `interval - elapsed`, floored at zero
///
/// A cycle that ran longer than the interval starts the next one
/// immediately; there is no missed-tick backlog and no catch-up burst.
pub fn compute_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Launch the background loop that runs one cycle per interval
///
/// Cancelling `token` is the sole termination mechanism; there is no
/// separate stop function. The returned handle exists so shutdown can
/// join the task.
pub fn start_test_loop(
    token: CancellationToken,
    interval: Duration,
    provider: Arc<dyn SpeedtestProvider>,
    metrics: ExporterMetrics,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // Cancellation is observed at iteration boundaries only; an
            // in-flight cycle always runs to completion.
            if token.is_cancelled() {
                break;
            }

            let start = Instant::now();
            run_cycle(provider.as_ref(), &metrics).await;
            let sleep_for = compute_sleep(interval, start.elapsed());

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        tracing::info!("Speed test loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sleep_is_interval_minus_elapsed() {
        assert_eq!(
            compute_sleep(Duration::from_secs(30), Duration::from_secs(2)),
            Duration::from_secs(28)
        );
        assert_eq!(
            compute_sleep(Duration::from_secs(30), Duration::from_secs(1)),
            Duration::from_secs(29)
        );
    }

    #[test]
    fn test_sleep_is_zero_when_cycle_outruns_interval() {
        assert_eq!(
            compute_sleep(Duration::from_secs(30), Duration::from_secs(30)),
            Duration::ZERO
        );
        assert_eq!(
            compute_sleep(Duration::from_secs(30), Duration::from_secs(95)),
            Duration::ZERO
        );
    }

    proptest! {
        #[test]
        fn prop_sleep_never_exceeds_interval_and_never_underflows(
            interval_ms in 1u64..3_600_000,
            elapsed_ms in 0u64..7_200_000,
        ) {
            let interval = Duration::from_millis(interval_ms);
            let elapsed = Duration::from_millis(elapsed_ms);
            let sleep = compute_sleep(interval, elapsed);

            prop_assert!(sleep <= interval);
            if elapsed >= interval {
                prop_assert_eq!(sleep, Duration::ZERO);
            } else {
                prop_assert_eq!(sleep + elapsed, interval);
            }
        }
    }
}
