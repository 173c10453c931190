use serde::{Deserialize, Serialize};

use super::additives::{AdditivePolicy, RiskTables};
use super::allergens::Adjustments;

pub const DEFAULT_NUTRITION_WEIGHT: f64 = 0.6;
pub const DEFAULT_ADDITIVES_WEIGHT: f64 = 0.3;

/// Main scoring configuration.
///
/// Every field is optional; anything left out falls back to the built-in
/// policy.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights: { nutrition: 0.6, additives: 0.3 }
///   organic_bonus: 5
///   allergen_penalty: -5
///   additives:
///     mode: tiered
///     high_risk: ["en:e171"]
///     medium_risk: ["en:e415"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Weights of the nutrition and additive sub-scores
    #[serde(default)]
    pub weights: Option<WeightsConfig>,

    /// Points added for organic products (default: 5)
    #[serde(default)]
    pub organic_bonus: Option<i8>,

    /// Points added (negative) when a concern allergen is present (default: -5)
    #[serde(default)]
    pub allergen_penalty: Option<i8>,

    /// Additive classification policy
    #[serde(default)]
    pub additives: Option<AdditivesConfig>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Some(WeightsConfig::default()),
            organic_bonus: Some(5),
            allergen_penalty: Some(-5),
            additives: Some(AdditivesConfig {
                mode: Some(AdditiveMode::Tiered),
                high_risk: Some(RiskTables::curated_high_risk()),
                medium_risk: Some(RiskTables::curated_medium_risk()),
            }),
        }
    }
}

impl ScoringConfig {
    pub fn weights(&self) -> WeightsConfig {
        self.weights.clone().unwrap_or_default()
    }

    pub fn adjustments(&self) -> Adjustments {
        let defaults = Adjustments::default();
        Adjustments {
            organic_bonus: self.organic_bonus.unwrap_or(defaults.organic_bonus),
            allergen_penalty: self.allergen_penalty.unwrap_or(defaults.allergen_penalty),
        }
    }

    pub fn additive_mode(&self) -> AdditiveMode {
        self.additives
            .as_ref()
            .and_then(|a| a.mode)
            .unwrap_or(AdditiveMode::Tiered)
    }

    /// Resolve the additive policy. A table that isn't given falls back to
    /// the curated one.
    pub fn additive_policy(&self) -> AdditivePolicy {
        match self.additive_mode() {
            AdditiveMode::Flat => AdditivePolicy::Flat,
            AdditiveMode::Tiered => {
                let additives = self.additives.as_ref();
                let high = additives
                    .and_then(|a| a.high_risk.clone())
                    .unwrap_or_else(RiskTables::curated_high_risk);
                let medium = additives
                    .and_then(|a| a.medium_risk.clone())
                    .unwrap_or_else(RiskTables::curated_medium_risk);
                AdditivePolicy::Tiered(RiskTables::new(high, medium))
            }
        }
    }
}

/// Sub-score weights. Both scaled components together must leave room for
/// the flat adjustments (nutrition + additives <= 0.9).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightsConfig {
    #[serde(default = "default_nutrition_weight")]
    pub nutrition: f64,
    #[serde(default = "default_additives_weight")]
    pub additives: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            nutrition: DEFAULT_NUTRITION_WEIGHT,
            additives: DEFAULT_ADDITIVES_WEIGHT,
        }
    }
}

fn default_nutrition_weight() -> f64 {
    DEFAULT_NUTRITION_WEIGHT
}

fn default_additives_weight() -> f64 {
    DEFAULT_ADDITIVES_WEIGHT
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdditiveMode {
    /// High / medium / low risk tables
    Tiered,
    /// Every additive costs the same; pairs with the strict grade scale
    Flat,
}

/// Additive classification configuration.
///
/// Risk tables replace the curated ones when given.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AdditivesConfig {
    #[serde(default)]
    pub mode: Option<AdditiveMode>,

    #[serde(default)]
    pub high_risk: Option<Vec<String>>,

    #[serde(default)]
    pub medium_risk: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Severity;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.weights(), WeightsConfig::default());
        assert_eq!(config.adjustments(), Adjustments::default());
        assert_eq!(config.additive_mode(), AdditiveMode::Tiered);
        assert_eq!(
            config.additive_policy(),
            AdditivePolicy::Tiered(RiskTables::curated())
        );
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert!(config.weights.is_none());
        assert!(config.additives.is_none());

        // Empty config still resolves to the built-in policy
        assert_eq!(config.weights(), WeightsConfig::default());
        assert_eq!(config.adjustments(), Adjustments::default());
        assert_eq!(
            config.additive_policy(),
            AdditivePolicy::Tiered(RiskTables::curated())
        );
    }

    #[test]
    fn test_partial_weights_parse() {
        let yaml = r#"
weights:
  nutrition: 0.5
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let weights = config.weights();
        assert_eq!(weights.nutrition, 0.5);
        assert_eq!(weights.additives, DEFAULT_ADDITIVES_WEIGHT);
    }

    #[test]
    fn test_full_scoring_config_parse() {
        let yaml = r#"
weights:
  nutrition: 0.55
  additives: 0.35
organic_bonus: 3
allergen_penalty: -10
additives:
  mode: tiered
  high_risk:
    - "x:bad"
  medium_risk:
    - "x:meh"
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.adjustments().organic_bonus, 3);
        assert_eq!(config.adjustments().allergen_penalty, -10);

        let AdditivePolicy::Tiered(tables) = config.additive_policy() else {
            panic!("expected tiered policy");
        };
        assert_eq!(tables.classify("x:bad"), Severity::High);
        assert_eq!(tables.classify("x:meh"), Severity::Medium);
        assert_eq!(tables.classify("en:e171"), Severity::Low);
    }

    #[test]
    fn test_missing_table_falls_back_to_curated() {
        let yaml = r#"
additives:
  high_risk: ["x:bad"]
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let AdditivePolicy::Tiered(tables) = config.additive_policy() else {
            panic!("expected tiered policy");
        };
        assert_eq!(tables.classify("x:bad"), Severity::High);
        assert_eq!(tables.classify("en:e415"), Severity::Medium);
    }

    #[test]
    fn test_flat_mode_parse() {
        let yaml = r#"
additives:
  mode: flat
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.additive_mode(), AdditiveMode::Flat);
        assert_eq!(config.additive_policy(), AdditivePolicy::Flat);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "base_score: 100\n";
        let result: Result<ScoringConfig, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }
}
