//! Measurement provider abstraction
//!
//! The exporter core never speaks the speed test wire protocol itself; it
//! depends on this trait and a provider implementation does the actual
//! network work. Tests substitute a scripted fake.

pub mod http;

pub use http::HttpSpeedtestProvider;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifying user/network info reported by the speed test service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Public IP address of this exporter as seen by the service
    pub ip: String,
    /// Internet service provider name
    pub isp: String,
}

impl std::fmt::Display for UserInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.isp, self.ip)
    }
}

/// A candidate speed test server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedtestServer {
    /// Server identifier assigned by the service
    pub id: String,
    /// Server location name
    pub name: String,
    /// Organization hosting the server
    pub sponsor: String,
    /// Host (host:port) used for measurement connections
    pub host: String,
    /// Upload endpoint URL; other measurement URLs derive from it
    pub url: String,
    /// Distance from the user in kilometers, as reported by the service
    #[serde(default)]
    pub distance: f64,
}

/// Abstract measurement capability
///
/// Operations mirror one test cycle: discover user info, discover servers,
/// select targets, then ping/upload/download against the chosen server.
#[async_trait]
pub trait SpeedtestProvider: Send + Sync {
    /// Fetch identifying user/network info
    async fn fetch_user_info(&self) -> Result<UserInfo>;

    /// Fetch the candidate server list
    async fn fetch_servers(&self) -> Result<Vec<SpeedtestServer>>;

    /// Select target servers from the candidate list
    ///
    /// The default selection orders candidates by reported distance,
    /// nearest first, with no server-ID filter. An empty input yields an
    /// empty output rather than an error; callers treat the absence of a
    /// usable target as a failed cycle.
    fn select_targets(&self, servers: &[SpeedtestServer]) -> Vec<SpeedtestServer> {
        let mut candidates = servers.to_vec();
        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }

    /// Measure round-trip latency to the server
    async fn ping(&self, server: &SpeedtestServer) -> Result<Duration>;

    /// Measure upload throughput, in bits per second
    async fn upload_test(&self, server: &SpeedtestServer) -> Result<f64>;

    /// Measure download throughput, in bits per second
    async fn download_test(&self, server: &SpeedtestServer) -> Result<f64>;
}
