//! One full speed test cycle
//!
//! A cycle walks its stages in order and stops at the first failure:
//! user info, server list, target selection, ping, upload, download.
//! Every attempt increments `test_count`; gauges update per completed
//! stage, so an upload failure still leaves that cycle's latency recorded;
//! `test_status` is set exactly once, to 1 only when every stage succeeded.

use crate::metrics::{ExporterMetrics, MeasurementLabels};
use crate::provider::SpeedtestProvider;

/// Run one measurement cycle, reporting outcomes through metrics and logs
pub async fn run_cycle(provider: &dyn SpeedtestProvider, metrics: &ExporterMetrics) {
    metrics.record_attempt();

    let user = match provider.fetch_user_info().await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch user info");
            metrics.record_status(false);
            return;
        }
    };

    let servers = match provider.fetch_servers().await {
        Ok(servers) => servers,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch server list");
            metrics.record_status(false);
            return;
        }
    };

    let targets = provider.select_targets(&servers);
    let Some(target) = targets.first() else {
        // No usable target is a failed cycle even though no error was raised.
        tracing::error!("Failed to find an appropriate server: no candidates");
        metrics.record_status(false);
        return;
    };

    let labels = MeasurementLabels {
        user_info: user.to_string(),
        server_host: target.host.clone(),
    };

    let latency = match provider.ping(target).await {
        Ok(latency) => latency,
        Err(e) => {
            tracing::error!(user_info = %user, server = %target.host, error = %e, "Failed to test ping");
            metrics.record_status(false);
            return;
        }
    };
    metrics.record_latency(&labels, latency.as_secs_f64());

    let upload_bps = match provider.upload_test(target).await {
        Ok(bps) => bps,
        Err(e) => {
            tracing::error!(user_info = %user, server = %target.host, error = %e, "Failed to test upload speed");
            metrics.record_status(false);
            return;
        }
    };
    metrics.record_upload(&labels, upload_bps);

    let download_bps = match provider.download_test(target).await {
        Ok(bps) => bps,
        Err(e) => {
            tracing::error!(user_info = %user, server = %target.host, error = %e, "Failed to test download speed");
            metrics.record_status(false);
            return;
        }
    };
    metrics.record_download(&labels, download_bps);

    // Signal a complete test
    metrics.record_status(true);

    tracing::info!(
        user_info = %user,
        server = %target.host,
        latency_seconds = latency.as_secs_f64(),
        upload_bps,
        download_bps,
        "Speed test completed"
    );
}
