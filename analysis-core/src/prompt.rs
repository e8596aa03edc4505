//! Prompt construction for the health analysis request.
//!
//! The prompt is a pure function of the [`HealthProfile`]: the same profile
//! always yields byte-identical text, and list fields keep the order in which
//! the owner entered them.

use crate::models::HealthProfile;
use std::fmt::Write;

/// Placeholder rendered for any empty list field.
pub const NONE_REPORTED: &str = "None reported";

/// Placeholder rendered when no dietary preference was given.
pub const STANDARD_DIET: &str = "Standard diet";

/// Analyst persona sent ahead of the profile.
pub const SYSTEM_PROMPT: &str = r#"You are a highly knowledgeable veterinary health analyst AI specializing in canine health assessment and nutritional supplementation. Your expertise includes:

- Breed-specific health predispositions and genetic conditions
- Age-related health risks and preventive care
- Nutritional science and supplement interactions
- Evidence-based veterinary medicine
- Risk assessment and probability analysis

Always provide accurate, science-based recommendations while emphasizing that your analysis supplements but never replaces professional veterinary care. Be thorough but clear, and always include appropriate disclaimers about seeking professional veterinary advice.

Your response must be a valid JSON object matching the AssessmentResult interface structure exactly."#;

/// The five facets the provider is asked to cover.
pub const ANALYSIS_INSTRUCTIONS: &str = r#"Based on this information, please provide a detailed analysis including:

1. Health risk assessment with specific conditions, their probability percentages, and prevention strategies
2. Evidence-based supplement recommendations with proper dosages, frequencies, and safety considerations
3. General health advice tailored to this specific dog
4. Assessment confidence level
5. Whether immediate veterinary consultation is recommended"#;

/// Shape the provider's reply must follow.
pub const RESPONSE_SCHEMA: &str = r#"{
  "dogInfo": <the provided dog info>,
  "healthPredictions": {
    "riskLevel": "low|moderate|high",
    "conditions": [
      {
        "name": "condition name",
        "probability": number (0-100),
        "description": "detailed description",
        "prevention": ["prevention strategy 1", "prevention strategy 2"]
      }
    ]
  },
  "supplementRecommendations": [
    {
      "name": "supplement name",
      "purpose": "why this supplement is recommended",
      "dosage": "specific dosage recommendation",
      "frequency": "how often to give",
      "benefits": ["benefit 1", "benefit 2"],
      "precautions": ["precaution 1", "precaution 2"],
      "priority": "essential|recommended|optional"
    }
  ],
  "generalAdvice": ["advice 1", "advice 2", "advice 3"],
  "vetVisitRecommended": boolean,
  "confidence": number (0-100)
}"#;

const CLOSING_GUIDANCE: &str = "Important: Base your analysis on current veterinary science, breed-specific research, and recognized nutritional guidelines. Consider breed predispositions, age-related risks, and the dog's current health status. Prioritize safety and always recommend veterinary consultation for concerning symptoms.";

/// Build the full prompt text for one profile.
pub fn build_prompt(profile: &HealthProfile) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\n");
    prompt.push_str(
        "Please analyze the following dog's health profile and provide a comprehensive \
         health risk assessment with personalized supplement recommendations.\n\n",
    );
    prompt.push_str(&describe_profile(profile));
    prompt.push('\n');
    prompt.push_str(ANALYSIS_INSTRUCTIONS);
    prompt.push_str("\n\nPlease respond with a JSON object that exactly matches this structure:\n\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push_str("\n\n");
    prompt.push_str(CLOSING_GUIDANCE);

    prompt
}

/// Render the profile as a bullet list, one line per field.
pub fn describe_profile(profile: &HealthProfile) -> String {
    let neutered = if profile.neutered {
        "spayed/neutered"
    } else {
        "intact"
    };
    let diet = if profile.dietary_preferences.trim().is_empty() {
        STANDARD_DIET
    } else {
        profile.dietary_preferences.as_str()
    };

    let mut block = String::from("Dog Information:\n");
    // Writing into a String cannot fail.
    let _ = writeln!(block, "- Name: {}", profile.name);
    let _ = writeln!(block, "- Breed: {}", profile.breed);
    let _ = writeln!(block, "- Age: {} years", profile.age);
    let _ = writeln!(block, "- Weight: {} lbs", profile.weight);
    let _ = writeln!(block, "- Sex: {} ({})", profile.sex, neutered);
    let _ = writeln!(block, "- Activity Level: {}", profile.activity_level);
    let _ = writeln!(block, "- Exercise Hours: {} hours/day", profile.exercise_hours);
    let _ = writeln!(block, "- Environment: {}", profile.environment);
    let _ = writeln!(
        block,
        "- Previous Health Issues: {}",
        join_or_placeholder(&profile.previous_health_issues)
    );
    let _ = writeln!(
        block,
        "- Current Medications: {}",
        join_or_placeholder(&profile.current_medications)
    );
    let _ = writeln!(
        block,
        "- Current Symptoms: {}",
        join_or_placeholder(&profile.symptoms)
    );
    let _ = writeln!(block, "- Dietary Preferences: {}", diet);
    let _ = writeln!(
        block,
        "- Known Allergies: {}",
        join_or_placeholder(&profile.allergies)
    );

    block
}

fn join_or_placeholder(items: &[String]) -> String {
    if items.is_empty() {
        NONE_REPORTED.to_string()
    } else {
        items.join(", ")
    }
}
