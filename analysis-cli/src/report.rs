//! Plain-text rendering of an assessment.

use analysis_core::models::{AssessmentResult, Priority};
use std::fmt::Write;

const DISCLAIMER: &str = "This assessment is for informational purposes only and should not \
replace professional veterinary advice. Always consult with a qualified veterinarian before \
making decisions about your pet's health or starting any new supplements or treatments. If \
your dog is showing concerning symptoms, please seek veterinary care immediately.";

fn priority_rank(priority: &Priority) -> u8 {
    match priority {
        Priority::Essential => 0,
        Priority::Recommended => 1,
        Priority::Optional => 2,
    }
}

pub fn render(result: &AssessmentResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &AssessmentResult) -> std::fmt::Result {
    let dog = &result.dog_info;
    writeln!(out, "Health Assessment for {}", dog.name)?;
    writeln!(
        out,
        "{}, {} years, {} lbs",
        dog.breed, dog.age, dog.weight
    )?;
    writeln!(
        out,
        "Overall Risk: {}    Confidence: {}%",
        result.health_predictions.risk_level.as_str().to_uppercase(),
        result.confidence.round()
    )?;
    if result.vet_visit_recommended {
        writeln!(out, "A veterinary visit is recommended.")?;
    }

    if !result.health_predictions.conditions.is_empty() {
        writeln!(out, "\nPotential Health Risks")?;
        for condition in &result.health_predictions.conditions {
            writeln!(
                out,
                "  {} ({}% risk)",
                condition.name,
                condition.probability.round()
            )?;
            if !condition.description.is_empty() {
                writeln!(out, "    {}", condition.description)?;
            }
            for tip in &condition.prevention {
                writeln!(out, "    - {}", tip)?;
            }
        }
    }

    if !result.supplement_recommendations.is_empty() {
        writeln!(out, "\nSupplement Recommendations")?;
        let mut supplements: Vec<_> = result.supplement_recommendations.iter().collect();
        supplements.sort_by_key(|s| priority_rank(&s.priority));
        for supplement in supplements {
            writeln!(
                out,
                "  {} [{}]",
                supplement.name,
                supplement.priority.as_str().to_uppercase()
            )?;
            writeln!(out, "    Purpose: {}", supplement.purpose)?;
            writeln!(
                out,
                "    Dosage: {}, {}",
                supplement.dosage, supplement.frequency
            )?;
            for benefit in &supplement.benefits {
                writeln!(out, "    + {}", benefit)?;
            }
            for precaution in &supplement.precautions {
                writeln!(out, "    ! {}", precaution)?;
            }
        }
    }

    if !result.general_advice.is_empty() {
        writeln!(out, "\nGeneral Health Advice")?;
        for advice in &result.general_advice {
            writeln!(out, "  - {}", advice)?;
        }
    }

    writeln!(out, "\n{}", DISCLAIMER)
}
