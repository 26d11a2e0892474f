//! Speedtest Exporter - service entry point
//!
//! Wires CLI parsing, logging, signal handling, and the runner together.
//! SIGINT/SIGTERM cancel a process-wide token; on cancellation the runner
//! and HTTP server get a fixed grace period to finish in-flight work.

use clap::Parser;
use speedtest_exporter::{
    cli::Cli,
    config::load_config,
    defaults::SHUTDOWN_GRACE,
    error::Result,
    logging,
    provider::HttpSpeedtestProvider,
    runner,
};
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(msg) = cli.validate() {
        eprintln!("Error: {}", msg);
        process::exit(1);
    }

    if let Err(e) = run_application(cli).await {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    logging::init(&config.log_level)?;

    if config.debug {
        println!("Configuration loaded successfully:");
        println!("  Test interval: {:?}", config.test_interval);
        println!("  Health/metrics port: {}", config.health_port);
        println!("  Log level: {}", config.log_level);
    }

    let token = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(token.clone()));

    let provider = Arc::new(HttpSpeedtestProvider::new()?);
    let handle = runner::start(token.clone(), config, provider).await?;

    // The token is plumbed up to SIGINT and SIGTERM, so just wait on it.
    token.cancelled().await;

    tracing::info!(
        timeout_seconds = SHUTDOWN_GRACE.as_secs(),
        "Server stopping, waiting for in-progress requests to finish"
    );

    if let Err(e) = handle.shutdown(SHUTDOWN_GRACE).await {
        tracing::error!(error = %e, "Shutdown failed");
    }

    tracing::info!("Server exited");

    Ok(())
}

/// Cancel the token when the process receives SIGINT or SIGTERM
async fn wait_for_shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    token.cancel();
}
