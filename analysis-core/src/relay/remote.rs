//! Relayed variant: forward the profile to an operator relay that holds the
//! provider credential.

use super::AssessmentSource;
use crate::error::AnalysisError;
use crate::models::HealthProfile;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Path of the analysis function on the relay.
pub const RELAY_ANALYZE_PATH: &str = "/functions/analyze-dog-health";

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Relay base URL, e.g. `https://relay.example.com`.
    pub base_url: String,
    pub operator_token: Secret<String>,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, operator_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            operator_token: Secret::new(operator_token.into()),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    dog_info: &'a HealthProfile,
}

pub struct RemoteSource {
    config: RemoteConfig,
    client: Client,
}

impl RemoteSource {
    pub fn new(config: RemoteConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Failed(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Timeouts are kept apart from other transport failures: the relay may
    /// still be running the analysis, so a resubmission would duplicate it.
    fn request_failed(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            tracing::warn!(
                timeout_secs = self.config.timeout.as_secs(),
                "Relay did not answer in time"
            );
            AnalysisError::Timeout(format!(
                "Relay did not answer within {}s",
                self.config.timeout.as_secs()
            ))
        } else {
            AnalysisError::transport(None, err.to_string())
        }
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            RELAY_ANALYZE_PATH
        )
    }
}

#[async_trait]
impl AssessmentSource for RemoteSource {
    async fn fetch(&self, profile: &HealthProfile) -> Result<Value, AnalysisError> {
        let response = self
            .client
            .post(self.analyze_url())
            .bearer_auth(self.config.operator_token.expose_secret())
            .json(&RelayRequest { dog_info: profile })
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_failed(e))?;
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        // An explicit error message wins over the status code.
        if let Some(message) = parsed.as_ref().and_then(error_message) {
            tracing::warn!(%status, error = %message, "Relay reported an error");
            return Err(AnalysisError::Relay(message));
        }

        if !status.is_success() {
            return Err(AnalysisError::transport(
                Some(status.as_u16()),
                format!("Relay request failed: {}", status),
            ));
        }

        parsed.ok_or(AnalysisError::Format { raw: body })
    }

    fn name(&self) -> &'static str {
        "relayed"
    }
}

/// The reply's `error` field as text. Strings are taken verbatim; any other
/// non-null value is rendered as JSON.
fn error_message(reply: &Value) -> Option<String> {
    match reply.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
