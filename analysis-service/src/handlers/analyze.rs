use crate::services::metrics::{record_analysis, record_provider_error, record_provider_latency};
use crate::startup::AppState;
use analysis_core::{AnalysisError, AssessmentResult, HealthProfile};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use service_core::error::AppError;
use std::time::Instant;
use validator::Validate;

/// Reported when the relay itself holds no provider key.
pub const PROVIDER_KEY_MISSING: &str = "Google AI API key not configured";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub dog_info: HealthProfile,
}

/// `POST /functions/analyze-dog-health`
#[tracing::instrument(skip_all, fields(dog = tracing::field::Empty))]
pub async fn analyze_dog_health(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AssessmentResult>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected malformed analysis request");
        AppError::BadRequest(rejection.body_text())
    })?;
    let profile = request.dog_info;
    profile.validate()?;

    tracing::Span::current().record("dog", profile.name.as_str());

    if !state.provider_key_configured {
        tracing::error!("GOOGLE_AI_API_KEY is not set; rejecting analysis");
        record_analysis("configuration");
        return Err(AppError::UpstreamFailed(format!(
            "Analysis failed: {}",
            PROVIDER_KEY_MISSING
        )));
    }

    let start = Instant::now();
    let outcome = state.relay.analyze(&profile).await;
    if reached_provider(&outcome) {
        record_provider_latency(&state.model, start.elapsed().as_secs_f64());
    }

    match outcome {
        Ok(result) => {
            record_analysis("success");
            tracing::info!(
                risk_level = %result.health_predictions.risk_level.as_str(),
                confidence = result.confidence,
                "Analysis completed"
            );
            Ok(Json(result))
        }
        Err(err) => {
            record_analysis(err.kind());
            record_provider_error(&state.model, err.kind());
            Err(AppError::UpstreamFailed(failure_message(&err)))
        }
    }
}

/// Configuration failures are raised before any provider call.
fn reached_provider<T>(outcome: &Result<T, AnalysisError>) -> bool {
    !matches!(outcome, Err(AnalysisError::Configuration(_)))
}

/// `Analysis failed: <message>`, without doubling the prefix.
fn failure_message(err: &AnalysisError) -> String {
    match err {
        AnalysisError::Failed(message) => format!("Analysis failed: {}", message),
        other => format!("Analysis failed: {}", other),
    }
}
