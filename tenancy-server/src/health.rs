//! Health checks.
//!
//! - **Liveness**: is the process serving requests? (`GET /`)
//! - **Readiness**: can it reach the master directory? (`GET /health/ready`)

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::service::OrganizationService;

/// Name reported by the liveness endpoint.
pub const SERVICE_NAME: &str = "Org Management Service";

/// Liveness check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessResult {
    /// Always "ok" while the process is serving.
    pub status: String,

    /// Service name.
    pub service: String,
}

/// Readiness check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResult {
    /// Is the service ready?
    pub ready: bool,

    /// Timestamp (RFC 3339).
    pub timestamp: String,

    /// Reason if not ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Directory ping latency in milliseconds.
    pub latency_ms: u64,
}

/// Health checker for the organization service.
pub struct HealthChecker {
    service: Arc<OrganizationService>,
    check_timeout: Duration,
}

impl HealthChecker {
    /// Create a health checker with a 5 second readiness timeout.
    pub fn new(service: Arc<OrganizationService>) -> Self {
        Self {
            service,
            check_timeout: Duration::from_secs(5),
        }
    }

    /// Override the readiness timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Quick liveness check.
    pub fn check_liveness(&self) -> LivenessResult {
        LivenessResult {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Readiness check: ping the master directory within the timeout.
    #[instrument(skip(self))]
    pub async fn check_readiness(&self) -> ReadinessResult {
        debug!("Performing readiness check");
        let start = Instant::now();

        let reason = match tokio::time::timeout(self.check_timeout, self.service.ping()).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("Directory unavailable: {e}")),
            Err(_) => Some(format!(
                "Directory ping timed out after {}ms",
                self.check_timeout.as_millis()
            )),
        };

        if let Some(reason) = &reason {
            warn!(reason = %reason, "Readiness check failed");
        }

        ReadinessResult {
            ready: reason.is_none(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            reason,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }
}
