//! HTTP measurement provider for speedtest.net-compatible services
//!
//! Discovery uses the service's JSON API; the measurements themselves run
//! against the selected server's PHP endpoints: repeated small GETs of
//! `latency.txt` for ping, a timed POST to `upload.php` for upload, and a
//! timed GET of a generated `random{N}x{N}.jpg` payload for download.

use super::{SpeedtestProvider, SpeedtestServer, UserInfo};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.speedtest.net";

/// Request timeout for discovery and measurement calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Number of latency samples per ping measurement; the minimum wins
const PING_SAMPLES: u32 = 3;

/// Upload payload size in bytes
const UPLOAD_BYTES: usize = 4_000_000;

/// Dimension of the generated download image (`random{N}x{N}.jpg`)
const DOWNLOAD_IMAGE_SIZE: u32 = 1500;

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    client: ClientInfo,
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    ip: String,
    isp: String,
}

#[derive(Debug, Deserialize)]
struct ServerEntry {
    id: String,
    name: String,
    sponsor: String,
    host: String,
    url: String,
    #[serde(default)]
    distance: f64,
}

impl From<ServerEntry> for SpeedtestServer {
    fn from(entry: ServerEntry) -> Self {
        SpeedtestServer {
            id: entry.id,
            name: entry.name,
            sponsor: entry.sponsor,
            host: entry.host,
            url: entry.url,
            distance: entry.distance,
        }
    }
}

/// Measurement provider backed by a speedtest.net-compatible HTTP API
pub struct HttpSpeedtestProvider {
    client: reqwest::Client,
    config_url: String,
    servers_url: String,
}

impl HttpSpeedtestProvider {
    /// Create a provider pointed at speedtest.net
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a provider pointed at an alternate service base URL
    ///
    /// Used by tests to substitute a local mock service.
    pub fn with_base_url(base: &str) -> Result<Self> {
        let base = base.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("speedtest-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config_url: format!("{}/api/js/config", base),
            servers_url: format!("{}/api/js/servers?engine=js", base),
        })
    }

    /// Derive a sibling measurement URL from the server's upload endpoint
    fn measurement_url(server: &SpeedtestServer, file: &str) -> Result<String> {
        let base = Url::parse(&server.url)?;
        let joined = base.join(file)?;
        Ok(joined.to_string())
    }
}

#[async_trait]
impl SpeedtestProvider for HttpSpeedtestProvider {
    async fn fetch_user_info(&self) -> Result<UserInfo> {
        let response = self
            .client
            .get(&self.config_url)
            .send()
            .await?
            .error_for_status()?;

        let config: ConfigResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(format!("invalid config response: {}", e)))?;

        Ok(UserInfo {
            ip: config.client.ip,
            isp: config.client.isp,
        })
    }

    async fn fetch_servers(&self) -> Result<Vec<SpeedtestServer>> {
        let response = self
            .client
            .get(&self.servers_url)
            .send()
            .await?
            .error_for_status()?;

        let entries: Vec<ServerEntry> = response
            .json()
            .await
            .map_err(|e| AppError::provider(format!("invalid server list response: {}", e)))?;

        Ok(entries.into_iter().map(SpeedtestServer::from).collect())
    }

    async fn ping(&self, server: &SpeedtestServer) -> Result<Duration> {
        let url = Self::measurement_url(server, "latency.txt")?;

        let mut best: Option<Duration> = None;
        for _ in 0..PING_SAMPLES {
            let start = Instant::now();
            self.client.get(&url).send().await?.error_for_status()?;
            let elapsed = start.elapsed();

            best = Some(match best {
                Some(current) => current.min(elapsed),
                None => elapsed,
            });
        }

        best.ok_or_else(|| AppError::provider("no latency samples collected"))
    }

    async fn upload_test(&self, server: &SpeedtestServer) -> Result<f64> {
        let payload = vec![0u8; UPLOAD_BYTES];

        let start = Instant::now();
        self.client
            .post(&server.url)
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        let elapsed = start.elapsed().as_secs_f64().max(f64::EPSILON);

        Ok((UPLOAD_BYTES as f64) * 8.0 / elapsed)
    }

    async fn download_test(&self, server: &SpeedtestServer) -> Result<f64> {
        let file = format!("random{0}x{0}.jpg", DOWNLOAD_IMAGE_SIZE);
        let url = Self::measurement_url(server, &file)?;

        let start = Instant::now();
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let elapsed = start.elapsed().as_secs_f64().max(f64::EPSILON);

        Ok((body.len() as f64) * 8.0 / elapsed)
    }
}
