use super::config::{AdditiveMode, ScoringConfig};

/// Scaled weights above this leave no room for the flat adjustments
const MAX_COMBINED_WEIGHT: f64 = 0.9;
const MAX_ORGANIC_BONUS: i8 = 20;
const MIN_ALLERGEN_PENALTY: i8 = -20;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Validate weights
    if let Some(ref weights) = config.weights {
        let mut weights_ok = true;
        for (name, value) in [("nutrition", weights.nutrition), ("additives", weights.additives)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!(
                    "scoring.weights.{}: must be a non-negative number, got {}",
                    name, value
                ));
                weights_ok = false;
            }
        }

        let combined = weights.nutrition + weights.additives;
        // Small tolerance so 0.6 + 0.3 is not rejected over float noise
        if weights_ok && combined > MAX_COMBINED_WEIGHT + 1e-9 {
            errors.push(format!(
                "scoring.weights: nutrition + additives must be at most {}, got {}",
                MAX_COMBINED_WEIGHT, combined
            ));
        }
    }

    // Validate adjustments
    if let Some(bonus) = config.organic_bonus {
        if !(0..=MAX_ORGANIC_BONUS).contains(&bonus) {
            errors.push(format!(
                "scoring.organic_bonus: must be between 0 and {}, got {}",
                MAX_ORGANIC_BONUS, bonus
            ));
        }
    }

    if let Some(penalty) = config.allergen_penalty {
        if !(MIN_ALLERGEN_PENALTY..=0).contains(&penalty) {
            errors.push(format!(
                "scoring.allergen_penalty: must be between {} and 0, got {}",
                MIN_ALLERGEN_PENALTY, penalty
            ));
        }
    }

    // Validate additive tables
    if let Some(ref additives) = config.additives {
        let tables = [
            ("high_risk", additives.high_risk.as_ref()),
            ("medium_risk", additives.medium_risk.as_ref()),
        ];

        for (name, table) in tables {
            let Some(table) = table else { continue };

            if additives.mode == Some(AdditiveMode::Flat) {
                errors.push(format!(
                    "scoring.additives.{}: risk tables are ignored in flat mode",
                    name
                ));
                continue;
            }

            for (i, tag) in table.iter().enumerate() {
                if tag.trim().is_empty() {
                    errors.push(format!("scoring.additives.{}[{}]: empty tag", name, i));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
