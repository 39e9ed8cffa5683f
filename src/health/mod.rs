// Health module - HTTP liveness probe for the supervised server

use crate::config::Config;
use crate::error::{Result, WardenError};
use std::fmt;
use std::time::Duration;

/// Outcome of a single health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The endpoint answered with an accepted status code
    Healthy { status: u16 },
    /// The endpoint answered with any other status code
    BadStatus { status: u16 },
    /// No response: connection refused, timeout, DNS failure, ...
    Unreachable { reason: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy { .. })
    }

    /// Classify an HTTP status code
    ///
    /// 304 counts as healthy: dev servers answer idle requests with it.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 | 304 => HealthStatus::Healthy { status },
            _ => HealthStatus::BadStatus { status },
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy { status } => write!(f, "healthy (status {})", status),
            HealthStatus::BadStatus { status } => write!(f, "unhealthy (status {})", status),
            HealthStatus::Unreachable { reason } => write!(f, "unreachable ({})", reason),
        }
    }
}

/// Bounded-timeout HTTP GET against `http://host:port/`
///
/// The probe never retries and never fails: transport errors are reported as
/// [`HealthStatus::Unreachable`]. Retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HealthProbe {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WardenError::ProbeError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("http://{}:{}/", host, port),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.server.host, config.server.port, config.probe_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe the endpoint once
    pub async fn check(&self) -> HealthStatus {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                let status = HealthStatus::from_status(response.status().as_u16());
                if !status.is_healthy() {
                    tracing::debug!("Health check failed with {}", status);
                }
                status
            }
            Err(e) => {
                tracing::debug!("Health check request to {} failed: {}", self.url, e);
                HealthStatus::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
