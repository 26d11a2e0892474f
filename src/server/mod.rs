//! Health and metrics HTTP server
//!
//! Serves three routes on one port:
//! - `GET /readiness` and `GET /liveness` always return 200. They report
//!   process-level forward progress only; measurement health is visible
//!   through the `test_status` gauge, never through these endpoints.
//! - `GET /metrics` renders the Prometheus text exposition.

use crate::error::{AppError, Result, ShutdownErrors};
use crate::metrics::ExporterMetrics;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running health/metrics server
///
/// The listener is bound before `start` returns, so a bind failure is a
/// startup error. Serving happens on a background task; unexpected serve
/// failures are logged rather than propagated.
pub struct HealthServer {
    local_addr: SocketAddr,
    drain: CancellationToken,
    handle: JoinHandle<()>,
}

/// Bind the listener and start serving in the background
pub async fn start(metrics: ExporterMetrics, port: u16) -> Result<HealthServer> {
    let app = build_router(metrics);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AppError::server(format!("failed to bind port {}: {}", port, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| AppError::server(format!("failed to read bound address: {}", e)))?;

    let drain = CancellationToken::new();
    let drain_signal = drain.clone();

    let handle = tokio::spawn(async move {
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain_signal.cancelled().await });
        if let Err(e) = serve.await {
            tracing::error!(error = %e, "Health/metrics server failed");
        }
    });

    tracing::info!(port = local_addr.port(), "HTTP server started");

    Ok(HealthServer {
        local_addr,
        drain,
        handle,
    })
}

pub fn build_router(metrics: ExporterMetrics) -> Router {
    Router::new()
        .route("/readiness", get(readiness))
        .route("/liveness", get(liveness))
        .route("/metrics", get(scrape))
        .with_state(metrics)
}

impl HealthServer {
    /// The address the listener is bound to (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Drain in-flight requests, bounded by `grace`, then force the listener closed
    ///
    /// Both the graceful drain and the forced close are attempted
    /// unconditionally; their errors are aggregated.
    pub async fn shutdown(self, grace: Duration) -> std::result::Result<(), ShutdownErrors> {
        let mut errors = ShutdownErrors::new();

        self.drain.cancel();

        let mut handle = self.handle;
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                errors.push(
                    "server drain",
                    AppError::server(format!("serve task failed during drain: {}", e)),
                );
            }
            Err(_) => {
                // Drain did not finish in time; force the listener closed.
                handle.abort();
                errors.push(
                    "server drain",
                    AppError::server(format!(
                        "graceful drain exceeded {:?}, listener force-closed",
                        grace
                    )),
                );
            }
        }

        errors.into_result()
    }
}

async fn readiness() -> impl IntoResponse {
    (StatusCode::OK, "ready")
}

async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

async fn scrape(State(metrics): State<ExporterMetrics>) -> Response {
    match metrics.gather() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_binds_ephemeral_port() {
        let metrics = ExporterMetrics::new().unwrap();
        let server = start(metrics, 0).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert!(server.shutdown(Duration::from_secs(5)).await.is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_startup_error() {
        let metrics = ExporterMetrics::new().unwrap();
        let first = start(metrics.clone(), 0).await.unwrap();
        let port = first.local_addr().port();

        let second = start(metrics, port).await;
        assert!(matches!(second, Err(AppError::Server(_))));

        assert!(first.shutdown(Duration::from_secs(5)).await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_on_drained_server() {
        let metrics = ExporterMetrics::new().unwrap();
        let server = start(metrics, 0).await.unwrap();
        // No in-flight requests: the drain finishes immediately.
        assert!(server.shutdown(Duration::from_millis(100)).await.is_ok());
    }
}
