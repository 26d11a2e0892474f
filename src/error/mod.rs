//! Error handling for the speedtest exporter

use thiserror::Error;

/// Custom error types for the speedtest exporter
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric instrument registration or encoding errors
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Measurement provider errors (user info, server list, ping, transfer tests)
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Health/metrics server errors (bind, serve, drain)
    #[error("Server error: {0}")]
    Server(String),

    /// Parsing errors (durations, URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new metrics error
    pub fn metrics<S: Into<String>>(message: S) -> Self {
        Self::Metrics(message.into())
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new server error
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Metrics(_) => "METRICS",
            Self::Provider(_) => "PROVIDER",
            Self::HttpRequest(_) => "HTTP",
            Self::Server(_) => "SERVER",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    ///
    /// The process exits 0 on a clean shutdown and 1 when any error escapes
    /// the top-level run.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::http_request(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AppError::http_request(format!("Connection failed: {}", err))
        } else {
            AppError::http_request(err.to_string())
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::parse(format!("Invalid URL: {}", err))
    }
}

impl From<prometheus::Error> for AppError {
    fn from(err: prometheus::Error) -> Self {
        AppError::metrics(err.to_string())
    }
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, AppError>;

/// A single failed shutdown step
#[derive(Debug)]
pub struct ShutdownFailure {
    /// Which shutdown step failed (e.g. "server drain", "metrics release")
    pub step: &'static str,
    /// The underlying error
    pub error: AppError,
}

/// Aggregated errors from independent shutdown steps
///
/// Shutdown runs every step unconditionally; a failure in one step never
/// prevents the others from running. All failures are collected here and
/// reported as a single combined error.
#[derive(Debug, Default)]
pub struct ShutdownErrors {
    failures: Vec<ShutdownFailure>,
}

impl ShutdownErrors {
    /// Create an empty error collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one shutdown step, keeping only failures
    pub fn record(&mut self, step: &'static str, result: Result<()>) {
        if let Err(error) = result {
            self.failures.push(ShutdownFailure { step, error });
        }
    }

    /// Record an already-extracted failure
    pub fn push(&mut self, step: &'static str, error: AppError) {
        self.failures.push(ShutdownFailure { step, error });
    }

    /// Absorb the failures from another collection
    pub fn extend(&mut self, other: ShutdownErrors) {
        self.failures.extend(other.failures);
    }

    /// True when no step failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed steps
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// The recorded failures, in the order the steps ran
    pub fn failures(&self) -> &[ShutdownFailure] {
        &self.failures
    }

    /// Convert to a result: `Ok(())` when every step succeeded
    pub fn into_result(self) -> std::result::Result<(), ShutdownErrors> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ShutdownErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} shutdown step(s) failed: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", failure.step, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownErrors {}
