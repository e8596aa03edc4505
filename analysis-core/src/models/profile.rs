//! Health profile collected by the questionnaire.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Breeds offered by the questionnaire. Any other breed is accepted as free text.
pub const COMMON_BREEDS: &[&str] = &[
    "Labrador Retriever",
    "Golden Retriever",
    "German Shepherd",
    "French Bulldog",
    "Bulldog",
    "Poodle",
    "Beagle",
    "Rottweiler",
    "Yorkshire Terrier",
    "Dachshund",
    "Siberian Husky",
    "Boxer",
    "Boston Terrier",
    "Shih Tzu",
    "Chihuahua",
    "Border Collie",
    "Mixed Breed",
];

/// Everything the owner told us about one dog.
///
/// The profile is immutable once submitted for analysis and is echoed back
/// untouched as `dogInfo` in every [`AssessmentResult`](super::AssessmentResult).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Breed is required"))]
    pub breed: String,

    /// Age in years.
    #[validate(range(exclusive_min = 0.0, message = "Age is required"))]
    pub age: f64,

    /// Weight in pounds.
    #[validate(range(exclusive_min = 0.0, message = "Weight is required"))]
    pub weight: f64,

    pub sex: Sex,

    pub neutered: bool,

    pub activity_level: ActivityLevel,

    #[serde(default)]
    pub previous_health_issues: Vec<String>,

    #[serde(default)]
    pub current_medications: Vec<String>,

    #[serde(default)]
    pub dietary_preferences: String,

    #[serde(default)]
    pub allergies: Vec<String>,

    pub environment: Environment,

    /// Daily exercise in hours.
    #[validate(range(min = 0.0, message = "Exercise hours cannot be negative"))]
    #[serde(default)]
    pub exercise_hours: f64,

    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::High => "high",
        }
    }
}

/// Where the dog lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    Apartment,
    HouseSmallYard,
    HouseLargeYard,
    Farm,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Apartment => "apartment",
            Environment::HouseSmallYard => "house-small-yard",
            Environment::HouseLargeYard => "house-large-yard",
            Environment::Farm => "farm",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
