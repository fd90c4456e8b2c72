//! Credential check against the monitoring API.

use serde::Serialize;
use tracing::{debug, info};

use monwatch_adapters::ApiError;

use crate::QueryEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: String,
}

impl HealthCheckResult {
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}

impl QueryEngine {
    /// Verify the configured API key.
    ///
    /// A reachable API always yields a result, even when it rejects the
    /// key. Only transport failures are returned as errors.
    pub async fn check_health(&self) -> Result<HealthCheckResult, ApiError> {
        let auth = self.api.verify_auth().await.map_err(|err| {
            debug!(error = %err, "Verify auth call failed");
            err
        })?;

        let (status, message) = match auth.code {
            200 => (HealthStatus::Ok, "Data source is working!".to_string()),
            401 => (HealthStatus::Error, "Unauthorized: Invalid API Key".to_string()),
            _ => (HealthStatus::Error, auth.text),
        };
        info!(code = auth.code, ?status, "Health check complete");
        Ok(HealthCheckResult { status, message })
    }
}
