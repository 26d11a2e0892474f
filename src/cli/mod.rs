//! Command-line interface for the exporter service

use clap::Parser;
use std::time::Duration;

/// Valid values for the `--log-level` flag
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Version string with the build timestamp, shown by `--version`'s long form
const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

/// Speedtest Exporter - periodic network speed tests exposed as Prometheus metrics
#[derive(Parser, Debug, Clone)]
#[command(name = "speedtest-exporter")]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// How often the speed test should run (e.g. "30s", "5m", or plain seconds)
    #[arg(long, value_parser = parse_interval)]
    pub test_interval: Option<Duration>,

    /// The port to use for the health and metrics endpoints
    #[arg(short, long)]
    pub port: Option<u16>,

    /// The log level to use: [trace, debug, info, warn, error]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the resolved configuration at startup
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments beyond what clap checks structurally
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref level) = self.log_level {
            if !VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(format!(
                    "Invalid log level '{}'. Valid levels: {}",
                    level,
                    VALID_LOG_LEVELS.join(", ")
                ));
            }
        }
        Ok(())
    }
}

/// Parse a test interval from a human-friendly duration string
///
/// Accepts a plain number of seconds ("30") or a number with a unit suffix:
/// "500ms", "30s", "5m", "1h". The interval must be strictly positive.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Interval cannot be empty".to_string());
    }

    let (value_str, unit) = match s.find(|c: char| c.is_ascii_alphabetic()) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, "s"),
    };

    let value: u64 = value_str
        .parse()
        .map_err(|_| format!("Invalid interval value '{}'", s))?;

    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value * 60),
        "h" => Duration::from_secs(value * 3600),
        other => return Err(format!("Unknown interval unit '{}'", other)),
    };

    if duration.is_zero() {
        return Err("--test-interval must be strictly positive".to_string());
    }

    Ok(duration)
}
