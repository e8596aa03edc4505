//! Error taxonomy for health analysis.

use crate::providers::ProviderError;
use thiserror::Error;

/// Why an analysis produced no result.
///
/// Every variant is recoverable: the caller may simply resubmit.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No credential, or an unusable one. Raised before any network call.
    #[error("{0}")]
    Configuration(String),

    /// The provider or relay could not be reached or answered with a
    /// non-success status. `status` is `None` for connection-level failures.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The relay did not answer within the client timeout. It may still be
    /// working on the request, so this is never retried.
    #[error("{0}")]
    Timeout(String),

    /// The provider's text was not valid JSON.
    #[error("Invalid response format from AI service")]
    Format { raw: String },

    /// The relay reported an explicit `error` message.
    #[error("{0}")]
    Relay(String),

    /// Anything else, with the underlying message attached.
    #[error("Analysis failed: {0}")]
    Failed(String),
}

impl AnalysisError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        AnalysisError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Configuration(_) => "configuration",
            AnalysisError::Transport { .. } => "transport",
            AnalysisError::Timeout(_) => "timeout",
            AnalysisError::Format { .. } => "format",
            AnalysisError::Relay(_) => "relay",
            AnalysisError::Failed(_) => "failed",
        }
    }

    /// Connection failures, rate limiting and server-side errors are worth
    /// another attempt; everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Transport { status: None, .. } => true,
            AnalysisError::Transport {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<ProviderError> for AnalysisError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AnalysisError::Configuration(msg),
            ProviderError::ApiError { status, message } => {
                AnalysisError::transport(Some(status), message)
            }
            ProviderError::RateLimited => {
                AnalysisError::transport(Some(429), "API request failed: rate limited")
            }
            ProviderError::NetworkError(msg) => AnalysisError::transport(None, msg),
            ProviderError::ContentFiltered => {
                AnalysisError::Failed("Response blocked by provider safety filters".to_string())
            }
            ProviderError::EmptyResponse => {
                AnalysisError::Failed("Provider returned no candidates".to_string())
            }
            ProviderError::MalformedResponse(msg) => AnalysisError::Failed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AnalysisError::transport(None, "connection reset").is_retryable());
        assert!(AnalysisError::transport(Some(503), "unavailable").is_retryable());
        assert!(AnalysisError::transport(Some(429), "slow down").is_retryable());
        assert!(!AnalysisError::transport(Some(400), "bad request").is_retryable());
        assert!(!AnalysisError::Format { raw: "nope".into() }.is_retryable());
        assert!(!AnalysisError::Relay("quota exceeded".into()).is_retryable());
        assert!(!AnalysisError::Configuration("missing".into()).is_retryable());
        assert!(!AnalysisError::Timeout("relay timed out".into()).is_retryable());
    }

    #[test]
    fn test_relay_message_is_verbatim() {
        let err = AnalysisError::Relay("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_provider_errors_map_to_taxonomy() {
        let err: AnalysisError = ProviderError::NotConfigured("Google AI API key not found".into()).into();
        assert!(matches!(err, AnalysisError::Configuration(_)));

        let err: AnalysisError = ProviderError::ApiError {
            status: 403,
            message: "API request failed: 403 Forbidden".into(),
        }
        .into();
        assert!(matches!(err, AnalysisError::Transport { status: Some(403), .. }));

        let err: AnalysisError = ProviderError::EmptyResponse.into();
        assert_eq!(err.kind(), "failed");
    }
}
