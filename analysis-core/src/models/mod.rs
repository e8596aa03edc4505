pub mod assessment;
pub mod profile;

pub use assessment::{
    AssessmentResult, Condition, HealthPredictions, Priority, RiskLevel, SupplementRecommendation,
};
pub use profile::{ActivityLevel, Environment, HealthProfile, Sex, COMMON_BREEDS};
