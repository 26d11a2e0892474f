//! Runtime configuration model and loading
//!
//! Configuration merges three sources, later ones winning:
//! defaults -> environment variables (after an optional `.env` file) -> CLI flags.

use crate::cli::Cli;
use crate::defaults;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration, immutable after startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// How often a speed test cycle runs
    #[serde(default = "default_test_interval")]
    pub test_interval: Duration,

    /// Port for the health and metrics endpoints
    #[serde(default = "default_health_port")]
    pub health_port: u16,

    /// Log verbosity level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Print the resolved configuration at startup
    #[serde(default)]
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            test_interval: default_test_interval(),
            health_port: default_health_port(),
            log_level: default_log_level(),
            debug: false,
        }
    }
}

impl RunConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.test_interval.is_zero() {
            return Err(AppError::config("test interval must be strictly positive"));
        }

        if !crate::cli::VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AppError::config(format!(
                "invalid log level '{}'",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(interval) = std::env::var("SPEEDTEST_TEST_INTERVAL") {
            let secs: u64 = interval.parse().map_err(|e| {
                AppError::config(format!(
                    "Invalid SPEEDTEST_TEST_INTERVAL value '{}': {}",
                    interval, e
                ))
            })?;
            self.test_interval = Duration::from_secs(secs);
        }

        if let Ok(port) = std::env::var("SPEEDTEST_PORT") {
            self.health_port = port.parse().map_err(|e| {
                AppError::config(format!("Invalid SPEEDTEST_PORT value '{}': {}", port, e))
            })?;
        }

        if let Ok(level) = std::env::var("SPEEDTEST_LOG_LEVEL") {
            self.log_level = level;
        }

        Ok(())
    }
}

/// Load the complete configuration from CLI arguments and the environment
pub fn load_config(cli: &Cli) -> Result<RunConfig> {
    // Start with defaults, then layer the environment and CLI on top
    let mut config = RunConfig::default();

    // A missing .env file is not an error
    let _ = dotenv::dotenv();

    config.merge_from_env()?;

    if let Some(interval) = cli.test_interval {
        config.test_interval = interval;
    }
    if let Some(port) = cli.port {
        config.health_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.log_level = level.clone();
    }
    config.debug = cli.debug;

    config.validate()?;

    Ok(config)
}

// Default value functions for serde
fn default_test_interval() -> Duration {
    defaults::DEFAULT_TEST_INTERVAL
}

fn default_health_port() -> u16 {
    defaults::DEFAULT_HEALTH_PORT
}

fn default_log_level() -> String {
    defaults::DEFAULT_LOG_LEVEL.to_string()
}
