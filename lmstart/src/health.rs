//! Health checks for the local API server
//!
//! The server speaks the OpenAI-compatible API, so a `GET /v1/models` that
//! answers 200 means it is up; the response also lists the loaded models.

use crate::AutomationError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Default address of the LM Studio API server
pub const DEFAULT_API_URL: &str = "http://localhost:1234";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Overall server health status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The API answered with 200
    Healthy,
    /// The API answered, but with an error status
    Degraded,
    /// The API could not be reached
    Unhealthy,
}

/// Outcome of one probe
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub status: HealthStatus,

    /// URL that was probed
    pub endpoint: String,

    /// HTTP status code, when the server answered
    pub http_status: Option<u16>,

    /// Ids of the models the server reports
    pub models: Vec<String>,

    /// Time taken to perform the check in milliseconds
    pub check_duration_ms: u64,

    /// Error message if the check failed
    pub error_message: Option<String>,
}

impl HealthCheckResult {
    pub fn healthy(endpoint: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            endpoint: endpoint.into(),
            http_status: Some(200),
            models,
            check_duration_ms: 0,
            error_message: None,
        }
    }

    pub fn degraded(endpoint: impl Into<String>, http_status: u16) -> Self {
        Self {
            status: HealthStatus::Degraded,
            endpoint: endpoint.into(),
            http_status: Some(http_status),
            models: Vec::new(),
            check_duration_ms: 0,
            error_message: Some(format!("API server answered {http_status}")),
        }
    }

    pub fn unhealthy(endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            endpoint: endpoint.into(),
            http_status: None,
            models: Vec::new(),
            check_duration_ms: 0,
            error_message: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Anything that can tell whether the API server is up
#[async_trait]
pub trait ServerHealthCheck: Send + Sync {
    async fn check_health(&self) -> HealthCheckResult;
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: Option<String>,
}

/// Probes the API server over HTTP
#[derive(Debug, Clone)]
pub struct ApiProbe {
    client: reqwest::Client,
    base_url: String,
}

impl ApiProbe {
    pub fn new(base_url: &str) -> Result<Self, AutomationError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AutomationError::InvalidArgument(format!(
                "API URL must start with http:// or https://, got '{base_url}'"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    async fn probe(&self, endpoint: String) -> Result<HealthCheckResult, AutomationError> {
        let response = self.client.get(&endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(HealthCheckResult::degraded(endpoint, status.as_u16()));
        }
        let result = match response.json::<ModelList>().await {
            Ok(list) => {
                let models = list
                    .data
                    .into_iter()
                    .map(|m| m.id.unwrap_or_else(|| "unknown".to_string()))
                    .collect();
                HealthCheckResult::healthy(endpoint, models)
            }
            Err(e) => {
                let mut result = HealthCheckResult::degraded(endpoint, status.as_u16());
                result.error_message = Some(format!("Unexpected model list: {e}"));
                result
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl ServerHealthCheck for ApiProbe {
    #[instrument(level = "debug", skip(self), fields(url = %self.models_url()))]
    async fn check_health(&self) -> HealthCheckResult {
        let started = Instant::now();
        let endpoint = self.models_url();
        let mut result = match self.probe(endpoint.clone()).await {
            Ok(result) => result,
            Err(e) => HealthCheckResult::unhealthy(endpoint, e.to_string()),
        };
        result.check_duration_ms = started.elapsed().as_millis() as u64;
        debug!(status = ?result.status, ms = result.check_duration_ms, "API probe finished");
        result
    }
}
