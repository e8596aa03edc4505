//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` endpoint of Google's Generative Language API.
//! The API key is read from a [`CredentialSource`] on every call, so a key
//! set after startup is picked up without rebuilding the provider.

use super::{
    FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use crate::credential::{validate_format, Credential, CredentialError, CredentialSource};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Model used unless configured otherwise.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Header accepted by the Gemini API in place of the `key` query parameter.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// How the API key travels to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialTransport {
    /// `x-goog-api-key` request header.
    #[default]
    Header,
    /// `?key=` query parameter.
    Query,
}

impl std::str::FromStr for CredentialTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "header" => Ok(CredentialTransport::Header),
            "query" => Ok(CredentialTransport::Query),
            other => Err(format!("unknown credential transport '{}'", other)),
        }
    }
}

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Scheme and host, without the `/v1beta` suffix.
    pub api_base: String,
    pub model: String,
    pub credential_transport: CredentialTransport,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            credential_transport: CredentialTransport::default(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    credentials: Arc<dyn CredentialSource>,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(
        config: GeminiConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            credentials,
            client,
        })
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models", self.config.api_base.trim_end_matches('/'))
    }

    fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.models_url(), self.config.model)
    }

    fn authorize(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        match self.config.credential_transport {
            CredentialTransport::Header => request.header(API_KEY_HEADER, credential.expose()),
            CredentialTransport::Query => request.query(&[("key", credential.expose())]),
        }
    }

    fn current_credential(&self) -> Result<Credential, ProviderError> {
        self.credentials
            .credential()
            .ok_or_else(|| ProviderError::NotConfigured("Google AI API key not found".to_string()))
    }

    /// Check a candidate key with a list-models call. Any non-success status
    /// means the key is not usable.
    pub async fn verify_credential(&self, credential: &Credential) -> Result<(), ProviderError> {
        let response = self
            .authorize(self.client.get(self.models_url()), credential)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            tracing::debug!(status = %response.status(), "Credential rejected by provider");
            Err(ProviderError::ApiError {
                status: response.status().as_u16(),
                message: format!("Health check failed: {}", response.status()),
            })
        }
    }

    /// Full check of a user-supplied key: format first, then liveness.
    pub async fn validate_key(&self, key: &str) -> Result<Credential, CredentialError> {
        let credential = validate_format(key)?;
        self.verify_credential(&credential).await.map_err(|e| {
            tracing::warn!(error = %e, "API key validation failed");
            CredentialError::Rejected
        })?;
        Ok(credential)
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        // Fails before touching the network.
        let credential = self.current_credential()?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .authorize(self.client.post(self.generate_url()), &credential)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %error_text, "Gemini API returned an error");

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: format!("API request failed: {}", status),
            });
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse provider response: {}", e))
        })?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let finish_reason = FinishReason::from_api(candidate.finish_reason.as_deref());
        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let text = candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(ProviderError::EmptyResponse)?;

        let usage = api_response.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let credential = self.current_credential()?;
        self.verify_credential(&credential).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}
