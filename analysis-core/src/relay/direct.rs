//! Direct variant: build the prompt and call the provider in-process.

use super::AssessmentSource;
use crate::error::AnalysisError;
use crate::models::HealthProfile;
use crate::prompt::build_prompt;
use crate::providers::{GenerationParams, TextProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct DirectSource {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl DirectSource {
    pub fn new(provider: Arc<dyn TextProvider>, params: GenerationParams) -> Self {
        Self { provider, params }
    }
}

/// Parse the provider's text as one JSON document.
pub(crate) fn parse_reply(text: &str) -> Result<Value, AnalysisError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::warn!(error = %e, raw = %text, "Provider reply is not valid JSON");
        AnalysisError::Format {
            raw: text.to_string(),
        }
    })
}

#[async_trait]
impl AssessmentSource for DirectSource {
    async fn fetch(&self, profile: &HealthProfile) -> Result<Value, AnalysisError> {
        let prompt = build_prompt(profile);
        let response = self.provider.generate(&prompt, &self.params).await?;

        tracing::info!(
            model = self.provider.model(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Provider reply received"
        );

        parse_reply(&response.text)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
