//! The analysis relay: one entry point for both deployment variants.
//!
//! [`AnalysisRelay`] is polymorphic over where the provider credential lives.
//! With a [`DirectSource`] the credential is held locally and the provider is
//! called from this process; with a [`RemoteSource`] the operator's relay
//! holds it and this process only forwards the profile. Either way the reply
//! is normalized here before it is returned.

pub mod direct;
pub mod remote;

pub use direct::DirectSource;
pub use remote::{RemoteConfig, RemoteSource, RELAY_ANALYZE_PATH};

use crate::credential::CredentialSource;
use crate::error::AnalysisError;
use crate::models::{AssessmentResult, HealthProfile};
use crate::normalize::normalize;
use crate::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::providers::GenerationParams;
use crate::retry::{retry_with_backoff, RetryConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Produces the provider's reply for one profile, not yet normalized.
#[async_trait]
pub trait AssessmentSource: Send + Sync {
    async fn fetch(&self, profile: &HealthProfile) -> Result<Value, AnalysisError>;

    /// Short label for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Which variant to run, chosen by configuration.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Call the provider directly with a locally held credential.
    Direct {
        gemini: GeminiConfig,
        params: GenerationParams,
    },
    /// Forward to an operator relay that holds the credential.
    Relayed(RemoteConfig),
}

pub struct AnalysisRelay {
    source: Arc<dyn AssessmentSource>,
    retry: RetryConfig,
}

impl AnalysisRelay {
    pub fn new(source: Arc<dyn AssessmentSource>, retry: RetryConfig) -> Self {
        Self { source, retry }
    }

    /// Build the relay for a configured backend. `credentials` is only
    /// consulted by the direct variant.
    pub fn from_backend(
        backend: Backend,
        credentials: Arc<dyn CredentialSource>,
        retry: RetryConfig,
    ) -> Result<Self, AnalysisError> {
        let source: Arc<dyn AssessmentSource> = match backend {
            Backend::Direct { gemini, params } => {
                let provider = GeminiTextProvider::new(gemini, credentials)?;
                Arc::new(DirectSource::new(Arc::new(provider), params))
            }
            Backend::Relayed(config) => Arc::new(RemoteSource::new(config)?),
        };
        Ok(Self::new(source, retry))
    }

    /// Analyze one profile.
    #[tracing::instrument(skip_all, fields(source = self.source.name()))]
    pub async fn analyze(&self, profile: &HealthProfile) -> Result<AssessmentResult, AnalysisError> {
        let reply = retry_with_backoff(&self.retry, "analyze_dog_health", || {
            self.source.fetch(profile)
        })
        .await
        .map_err(|e| {
            tracing::error!(kind = e.kind(), error = %e, "AI analysis error");
            e
        })?;

        Ok(normalize(&reply, profile))
    }
}
