//! Structured logging initialization
//!
//! Logs are emitted as JSON lines on stderr so they can be picked up by
//! log aggregators without further parsing. The level comes from the
//! `--log-level` flag and can be overridden per-module via `RUST_LOG`.

use crate::error::{AppError, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Returns an error when the level string cannot be parsed into a filter
/// directive or when a subscriber was already installed.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::config(format!("invalid log filter '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::internal(format!("failed to install tracing subscriber: {}", e)))?;

    Ok(())
}
