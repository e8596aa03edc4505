//! Normalization of provider replies into an [`AssessmentResult`].
//!
//! Provider output is only loosely trusted: any missing, null or mistyped
//! field falls back to its default instead of failing the whole analysis.
//! Malformed entries inside lists are dropped. The profile is always the
//! caller's own copy.

use crate::models::{
    AssessmentResult, Condition, HealthPredictions, HealthProfile, Priority, RiskLevel,
    SupplementRecommendation,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Confidence used when the provider does not report one.
pub const DEFAULT_CONFIDENCE: f64 = 70.0;

/// Build an [`AssessmentResult`] from a parsed provider reply.
///
/// Re-normalizing an already normalized result yields an identical value.
pub fn normalize(reply: &Value, profile: &HealthProfile) -> AssessmentResult {
    let raw = if reply.is_object() {
        RawAssessment::deserialize(reply).unwrap_or_default()
    } else {
        tracing::warn!("Provider reply is not a JSON object, using defaults");
        RawAssessment::default()
    };

    let result = AssessmentResult {
        dog_info: profile.clone(),
        health_predictions: HealthPredictions {
            risk_level: raw.health_predictions.risk_level,
            conditions: raw.health_predictions.conditions,
        },
        supplement_recommendations: raw.supplement_recommendations,
        general_advice: raw.general_advice,
        vet_visit_recommended: raw.vet_visit_recommended,
        confidence: clamp_confidence(raw.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
    };

    let dropped = dropped_entries(reply, &result);
    if dropped > 0 {
        tracing::warn!(dropped, "Discarded malformed entries from provider reply");
    }

    result
}

/// Clamp a confidence value into `0..=100`.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return DEFAULT_CONFIDENCE;
    }
    confidence.clamp(0.0, 100.0)
}

fn dropped_entries(reply: &Value, result: &AssessmentResult) -> usize {
    let len = |pointer: &str| {
        reply
            .pointer(pointer)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    };

    let conditions = len("/healthPredictions/conditions")
        .saturating_sub(result.health_predictions.conditions.len());
    let supplements = len("/supplementRecommendations")
        .saturating_sub(result.supplement_recommendations.len());
    let advice = len("/generalAdvice").saturating_sub(result.general_advice.len());

    conditions + supplements + advice
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    #[serde(default, deserialize_with = "or_default")]
    health_predictions: RawPredictions,
    #[serde(default, deserialize_with = "valid_entries")]
    supplement_recommendations: Vec<SupplementRecommendation>,
    #[serde(default, deserialize_with = "valid_entries")]
    general_advice: Vec<String>,
    #[serde(default, deserialize_with = "or_default")]
    vet_visit_recommended: bool,
    #[serde(default, deserialize_with = "or_default")]
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPredictions {
    #[serde(default, deserialize_with = "or_default")]
    risk_level: RiskLevel,
    #[serde(default, deserialize_with = "valid_entries")]
    conditions: Vec<Condition>,
}

/// Field-by-field decoding of a provider condition: one bad field resets
/// that field alone.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LenientCondition {
    #[serde(default, deserialize_with = "or_default")]
    name: String,
    #[serde(default, deserialize_with = "or_default")]
    probability: f64,
    #[serde(default, deserialize_with = "or_default")]
    description: String,
    #[serde(default, deserialize_with = "valid_entries")]
    prevention: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LenientSupplement {
    #[serde(default, deserialize_with = "or_default")]
    name: String,
    #[serde(default, deserialize_with = "or_default")]
    purpose: String,
    #[serde(default, deserialize_with = "or_default")]
    dosage: String,
    #[serde(default, deserialize_with = "or_default")]
    frequency: String,
    #[serde(default, deserialize_with = "valid_entries")]
    benefits: Vec<String>,
    #[serde(default, deserialize_with = "valid_entries")]
    precautions: Vec<String>,
    #[serde(default, deserialize_with = "or_default")]
    priority: Priority,
}

/// Entry types that can be recovered from a partially valid JSON object.
trait Recover: Sized {
    fn recover(value: Value) -> Option<Self>;
}

impl Recover for String {
    fn recover(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Recover for Condition {
    fn recover(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let c = LenientCondition::deserialize(value).ok()?;
        Some(Condition {
            name: c.name,
            probability: c.probability,
            description: c.description,
            prevention: c.prevention,
        })
    }
}

impl Recover for SupplementRecommendation {
    fn recover(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let s = LenientSupplement::deserialize(value).ok()?;
        Some(SupplementRecommendation {
            name: s.name,
            purpose: s.purpose,
            dosage: s.dosage,
            frequency: s.frequency,
            benefits: s.benefits,
            precautions: s.precautions,
            priority: s.priority,
        })
    }
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn valid_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Recover,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };
    Ok(entries.into_iter().filter_map(T::recover).collect())
}
