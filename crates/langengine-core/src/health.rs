//! Embedding provider health reports.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Whether a provider answered its health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceStatus {
    /// The check succeeded.
    Healthy,
    /// The check failed; `message` says why.
    Unhealthy,
}

/// Result of a health check against an embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    /// Round trip of the check request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Dimension of the vectors the provider returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    pub checked_at: Timestamp,
}

impl ServiceHealth {
    /// Creates a healthy report.
    pub fn healthy() -> Self {
        Self::new(ServiceStatus::Healthy, None)
    }

    /// Creates an unhealthy report with the failure reason.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(ServiceStatus::Unhealthy, Some(message.into()))
    }

    fn new(status: ServiceStatus, message: Option<String>) -> Self {
        Self {
            status,
            latency: None,
            message,
            dimension: None,
            checked_at: Timestamp::now(),
        }
    }

    /// Records how long the check took.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Records the dimension of the test embedding.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}
