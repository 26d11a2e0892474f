//! Shared test support: a scripted measurement provider and exposition helpers
#![allow(dead_code)]

use async_trait::async_trait;
use speedtest_exporter::error::{AppError, Result};
use speedtest_exporter::provider::{SpeedtestProvider, SpeedtestServer, UserInfo};
use std::time::Duration;

/// A fully scripted provider for driving the runner without any network
#[derive(Clone)]
pub struct FakeProvider {
    pub fail_user_info: bool,
    pub fail_servers: bool,
    pub fail_ping: bool,
    pub fail_upload: bool,
    pub fail_download: bool,
    /// Candidate servers returned by discovery; empty simulates zero candidates
    pub servers: Vec<SpeedtestServer>,
    /// Time spent inside the user-info stage, to simulate cycle duration
    pub cycle_delay: Duration,
    pub latency: Duration,
    pub upload_bps: f64,
    pub download_bps: f64,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            fail_user_info: false,
            fail_servers: false,
            fail_ping: false,
            fail_upload: false,
            fail_download: false,
            servers: vec![
                test_server("10", "alpha.example.net:8080", 12.0),
                test_server("20", "beta.example.net:8080", 45.0),
            ],
            cycle_delay: Duration::ZERO,
            latency: Duration::from_millis(23),
            upload_bps: 95_000_000.0,
            download_bps: 480_000_000.0,
        }
    }
}

pub fn test_server(id: &str, host: &str, distance: f64) -> SpeedtestServer {
    SpeedtestServer {
        id: id.to_string(),
        name: "Test City".to_string(),
        sponsor: "Test Sponsor".to_string(),
        host: host.to_string(),
        url: format!("http://{}/speedtest/upload.php", host),
        distance,
    }
}

#[async_trait]
impl SpeedtestProvider for FakeProvider {
    async fn fetch_user_info(&self) -> Result<UserInfo> {
        if !self.cycle_delay.is_zero() {
            tokio::time::sleep(self.cycle_delay).await;
        }
        if self.fail_user_info {
            return Err(AppError::provider("scripted user info failure"));
        }
        Ok(UserInfo {
            ip: "203.0.113.7".to_string(),
            isp: "Example ISP".to_string(),
        })
    }

    async fn fetch_servers(&self) -> Result<Vec<SpeedtestServer>> {
        if self.fail_servers {
            return Err(AppError::provider("scripted server list failure"));
        }
        Ok(self.servers.clone())
    }

    async fn ping(&self, _server: &SpeedtestServer) -> Result<Duration> {
        if self.fail_ping {
            return Err(AppError::provider("scripted ping failure"));
        }
        Ok(self.latency)
    }

    async fn upload_test(&self, _server: &SpeedtestServer) -> Result<f64> {
        if self.fail_upload {
            return Err(AppError::provider("scripted upload failure"));
        }
        Ok(self.upload_bps)
    }

    async fn download_test(&self, _server: &SpeedtestServer) -> Result<f64> {
        if self.fail_download {
            return Err(AppError::provider("scripted download failure"));
        }
        Ok(self.download_bps)
    }
}

/// Extract the value of an unlabeled metric from Prometheus text exposition
pub fn metric_value(exposition: &str, name: &str) -> Option<f64> {
    exposition
        .lines()
        .find(|line| !line.starts_with('#') && line.split_whitespace().next() == Some(name))
        .and_then(|line| line.split_whitespace().last())
        .and_then(|value| value.parse().ok())
}

/// Extract the value of the first sample of a labeled metric family
pub fn labeled_metric_value(exposition: &str, name: &str) -> Option<f64> {
    exposition
        .lines()
        .find(|line| !line.starts_with('#') && line.starts_with(&format!("{}{{", name)))
        .and_then(|line| line.split_whitespace().last())
        .and_then(|value| value.parse().ok())
}
