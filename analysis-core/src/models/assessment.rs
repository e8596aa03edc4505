//! Normalized assessment returned to the owner.

use super::HealthProfile;
use serde::{Deserialize, Serialize};

/// Risk assessment and supplement plan for one dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// The caller's original profile, never the provider's echo of it.
    pub dog_info: HealthProfile,
    pub health_predictions: HealthPredictions,
    pub supplement_recommendations: Vec<SupplementRecommendation>,
    pub general_advice: Vec<String>,
    pub vet_visit_recommended: bool,
    /// Always within `0..=100`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPredictions {
    pub risk_level: RiskLevel,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// A condition the dog may be predisposed to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    /// Percentage as reported by the provider; not clamped.
    pub probability: f64,
    pub description: String,
    pub prevention: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementRecommendation {
    pub name: String,
    pub purpose: String,
    pub dosage: String,
    pub frequency: String,
    pub benefits: Vec<String>,
    pub precautions: Vec<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Essential,
    #[default]
    Recommended,
    Optional,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Essential => "essential",
            Priority::Recommended => "recommended",
            Priority::Optional => "optional",
        }
    }
}
