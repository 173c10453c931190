use serde::{Deserialize, Serialize};

use super::additives::{AdditiveScore, AdditiveScorer};
use super::allergens::{self, Adjustments, AllergenEvaluation};
use super::config::{ScoringConfig, WeightsConfig};
use super::nutrition::{compute_nutrition_score, NutritionScore};
use crate::product::ProductFacts;

/// Category tag fragment that marks a water product
const WATER_CATEGORY_MARKER: &str = "waters";

/// Four-tier grade. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Poor,
    Average,
    Good,
    Excellent,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Poor => "poor",
            Grade::Average => "average",
            Grade::Good => "good",
            Grade::Excellent => "excellent",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade thresholds. Each scale is paired with one additive policy and is
/// never chosen independently of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeScale {
    /// 80 / 60 / 40, paired with tiered additive risk
    Standard,
    /// 90 / 70 / 50, paired with the flat additive mode
    Strict,
}

impl GradeScale {
    /// Lower bounds for excellent, good and average
    pub fn thresholds(self) -> [u8; 3] {
        match self {
            GradeScale::Standard => [80, 60, 40],
            GradeScale::Strict => [90, 70, 50],
        }
    }

    pub fn grade(self, total: u8) -> Grade {
        let [excellent, good, average] = self.thresholds();
        if total >= excellent {
            Grade::Excellent
        } else if total >= good {
            Grade::Good
        } else if total >= average {
            Grade::Average
        } else {
            Grade::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub nutrition: NutritionScore,
    pub additives: AdditiveScore,
    pub allergen_penalty: i8,
    pub organic_bonus: i8,
    pub is_organic: bool,
    pub has_concerning_allergen: bool,
    /// The pure-water rule replaced the weighted formula
    pub pure_water: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0-100
    pub total: u8,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
}

/// A resolved scoring policy. Build once, score many products; the engine
/// holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    additives: AdditiveScorer,
    weights: WeightsConfig,
    adjustments: Adjustments,
    scale: GradeScale,
}

impl ScoringEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        let additives = AdditiveScorer::new(config.additive_policy());
        let scale = if additives.is_flat() {
            GradeScale::Strict
        } else {
            GradeScale::Standard
        };

        Self {
            additives,
            weights: config.weights(),
            adjustments: config.adjustments(),
            scale,
        }
    }

    pub fn grade_scale(&self) -> GradeScale {
        self.scale
    }

    pub fn score(&self, facts: &ProductFacts) -> ScoreResult {
        let nutrition = compute_nutrition_score(&facts.nutrients);
        let additives = self.additives.score(&facts.additive_tags);
        let allergens = allergens::evaluate(facts, &self.adjustments);

        self.aggregate(nutrition, additives, allergens, is_pure_water(facts))
    }

    /// Combine the sub-scores into a total and a grade.
    ///
    /// Pure water is excellent by definition: the rule replaces the weighted
    /// formula and clears every penalty from the breakdown.
    pub fn aggregate(
        &self,
        mut nutrition: NutritionScore,
        mut additives: AdditiveScore,
        allergens: AllergenEvaluation,
        pure_water: bool,
    ) -> ScoreResult {
        nutrition.score = nutrition.score.min(100);
        additives.score = additives.score.min(100);

        let mut allergen_penalty = allergens.allergen_penalty.min(0);
        let organic_bonus = allergens.organic_bonus.max(0);

        let total = if pure_water {
            tracing::debug!("pure water rule applied");
            nutrition.score = 100;
            additives.score = 100;
            additives.penalty = 0;
            allergen_penalty = 0;
            100
        } else {
            let weighted = f64::from(nutrition.score) * self.weights.nutrition
                + f64::from(additives.score) * self.weights.additives
                + f64::from(organic_bonus)
                + f64::from(allergen_penalty);
            clamp_total(weighted)
        };

        ScoreResult {
            total,
            grade: self.scale.grade(total),
            breakdown: ScoreBreakdown {
                nutrition,
                additives,
                allergen_penalty,
                organic_bonus,
                is_organic: allergens.is_organic,
                has_concerning_allergen: allergens.has_concerning_allergen,
                pure_water,
            },
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

/// Score a single product with the given configuration
pub fn score_product(facts: &ProductFacts, config: &ScoringConfig) -> ScoreResult {
    ScoringEngine::new(config).score(facts)
}

/// Water category with no sugar, no saturated fat and no additives.
/// Absent sugar or fat counts as zero: water labels routinely omit them.
pub fn is_pure_water(facts: &ProductFacts) -> bool {
    let is_water_category = facts
        .category_tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(WATER_CATEGORY_MARKER));

    is_water_category
        && facts.nutrients.sugars.unwrap_or(0.0) == 0.0
        && facts.nutrients.saturated_fat.unwrap_or(0.0) == 0.0
        && facts.additive_tags.is_empty()
}

fn clamp_total(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Nutrients;
    use crate::scoring::{AdditiveMode, AdditivesConfig, Severity};

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn junk_food() -> ProductFacts {
        ProductFacts {
            nutrients: Nutrients {
                energy_kcal: Some(480.0),
                sugars: Some(40.0),
                saturated_fat: Some(9.0),
                sodium_mg: Some(800.0),
                fiber: Some(0.0),
                protein: Some(0.0),
            },
            ..Default::default()
        }
    }

    fn water() -> ProductFacts {
        ProductFacts {
            nutrients: Nutrients {
                sugars: Some(0.0),
                saturated_fat: Some(0.0),
                sodium_mg: Some(1200.0),
                ..Default::default()
            },
            category_tags: tags(&["en:beverages", "en:waters", "en:mineral-waters"]),
            allergen_tags: tags(&["en:sulfites"]),
            ..Default::default()
        }
    }

    fn flat_config() -> ScoringConfig {
        ScoringConfig {
            additives: Some(AdditivesConfig {
                mode: Some(AdditiveMode::Flat),
                high_risk: None,
                medium_risk: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_grade_thresholds_standard() {
        let scale = GradeScale::Standard;
        assert_eq!(scale.grade(100), Grade::Excellent);
        assert_eq!(scale.grade(80), Grade::Excellent);
        assert_eq!(scale.grade(79), Grade::Good);
        assert_eq!(scale.grade(60), Grade::Good);
        assert_eq!(scale.grade(59), Grade::Average);
        assert_eq!(scale.grade(40), Grade::Average);
        assert_eq!(scale.grade(39), Grade::Poor);
        assert_eq!(scale.grade(0), Grade::Poor);
    }

    #[test]
    fn test_grade_thresholds_strict() {
        let scale = GradeScale::Strict;
        assert_eq!(scale.grade(89), Grade::Good);
        assert_eq!(scale.grade(90), Grade::Excellent);
        assert_eq!(scale.grade(69), Grade::Average);
        assert_eq!(scale.grade(49), Grade::Poor);
    }

    #[test]
    fn test_grade_monotonic_over_full_range() {
        for scale in [GradeScale::Standard, GradeScale::Strict] {
            for total in 0..100u8 {
                assert!(scale.grade(total) <= scale.grade(total + 1));
            }
        }
    }

    #[test]
    fn test_junk_food_is_poor() {
        let result = ScoringEngine::default().score(&junk_food());

        assert_eq!(result.breakdown.nutrition.score, 14);
        assert_eq!(result.breakdown.additives.score, 100);
        // 14 * 0.6 + 100 * 0.3 = 38.4
        assert_eq!(result.total, 38);
        assert_eq!(result.grade, Grade::Poor);
    }

    #[test]
    fn test_absent_nutrients_with_high_risk_additive_is_good() {
        let facts = ProductFacts {
            additive_tags: tags(&["en:e171"]),
            ..Default::default()
        };
        let result = ScoringEngine::default().score(&facts);

        assert_eq!(result.breakdown.additives.score, 90);
        assert_eq!(
            result.breakdown.additives.flagged_additives[0].severity,
            Severity::High
        );
        // 80 * 0.6 + 90 * 0.3 = 75
        assert_eq!(result.total, 75);
        assert_eq!(result.grade, Grade::Good);
    }

    #[test]
    fn test_pure_water_override() {
        let result = ScoringEngine::default().score(&water());

        assert_eq!(result.total, 100);
        assert_eq!(result.grade, Grade::Excellent);
        assert!(result.breakdown.pure_water);
        assert_eq!(result.breakdown.nutrition.score, 100);
        assert_eq!(result.breakdown.additives.penalty, 0);
        // The allergen is still reported, but its penalty is cleared
        assert!(result.breakdown.has_concerning_allergen);
        assert_eq!(result.breakdown.allergen_penalty, 0);
    }

    #[test]
    fn test_water_with_missing_sugar_and_fat_still_pure() {
        let mut facts = water();
        facts.nutrients.sugars = None;
        facts.nutrients.saturated_fat = None;
        assert!(is_pure_water(&facts));
    }

    #[test]
    fn test_water_override_requires_every_condition() {
        let mut sweet = water();
        sweet.nutrients.sugars = Some(4.0);
        assert!(!is_pure_water(&sweet));

        let mut fatty = water();
        fatty.nutrients.saturated_fat = Some(0.1);
        assert!(!is_pure_water(&fatty));

        let mut additive = water();
        additive.additive_tags = tags(&["en:e290"]);
        assert!(!is_pure_water(&additive));

        let mut not_water = water();
        not_water.category_tags = tags(&["en:sodas"]);
        assert!(!is_pure_water(&not_water));

        let result = ScoringEngine::default().score(&sweet);
        assert!(!result.breakdown.pure_water);
    }

    #[test]
    fn test_organic_bonus_applied() {
        let plain = ProductFacts {
            additive_tags: tags(&["en:e171"]),
            ..Default::default()
        };
        let organic = ProductFacts {
            label_tags: tags(&["en:organic"]),
            ..plain.clone()
        };

        let engine = ScoringEngine::default();
        assert_eq!(engine.score(&organic).total, engine.score(&plain).total + 5);
    }

    #[test]
    fn test_allergen_penalty_applied() {
        let facts = ProductFacts {
            allergen_tags: tags(&["en:peanuts"]),
            ..Default::default()
        };
        let result = ScoringEngine::default().score(&facts);
        // 80 * 0.6 + 100 * 0.3 - 5 = 73
        assert_eq!(result.total, 73);
        assert_eq!(result.breakdown.allergen_penalty, -5);
    }

    #[test]
    fn test_total_clamped_low() {
        let mut facts = junk_food();
        facts.nutrients.energy_kcal = Some(900.0);
        facts.nutrients.sugars = Some(90.0);
        facts.nutrients.saturated_fat = Some(30.0);
        facts.nutrients.sodium_mg = Some(3000.0);
        facts.additive_tags = vec!["en:e171".to_string(); 20];
        facts.allergen_tags = tags(&["en:milk"]);

        let result = ScoringEngine::default().score(&facts);
        assert_eq!(result.total, 0);
        assert_eq!(result.grade, Grade::Poor);
    }

    #[test]
    fn test_total_clamped_high() {
        let config = ScoringConfig {
            weights: Some(WeightsConfig {
                nutrition: 0.9,
                additives: 0.9,
            }),
            ..Default::default()
        };
        let facts = ProductFacts {
            label_tags: tags(&["en:organic"]),
            ..Default::default()
        };
        let result = score_product(&facts, &config);
        assert_eq!(result.total, 100);
    }

    #[test]
    fn test_out_of_range_sub_scores_clamped() {
        let engine = ScoringEngine::default();
        let nutrition = NutritionScore {
            score: 250,
            details: Default::default(),
        };
        let additives = AdditiveScore {
            score: 200,
            penalty: 0,
            flagged_additives: vec![],
        };
        let result = engine.aggregate(nutrition, additives, AllergenEvaluation::default(), false);

        assert_eq!(result.breakdown.nutrition.score, 100);
        assert_eq!(result.breakdown.additives.score, 100);
        assert_eq!(result.total, 90);
    }

    #[test]
    fn test_flat_mode_pairs_with_strict_scale() {
        let engine = ScoringEngine::new(&flat_config());
        assert_eq!(engine.grade_scale(), GradeScale::Strict);
        assert_eq!(ScoringEngine::default().grade_scale(), GradeScale::Standard);

        let facts = ProductFacts {
            additive_tags: tags(&["en:e171"]),
            ..Default::default()
        };
        let result = engine.score(&facts);
        // 80 * 0.6 + 98 * 0.3 = 77.4
        assert_eq!(result.total, 77);
        assert_eq!(result.grade, Grade::Good);
        assert_eq!(
            result.breakdown.additives.flagged_additives[0].severity,
            Severity::Unknown
        );
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let mut facts = junk_food();
        facts.additive_tags = tags(&["en:e330", "en:e171", "en:e415"]);
        facts.allergen_tags = tags(&["en:milk"]);
        facts.label_tags = tags(&["en:organic"]);

        let engine = ScoringEngine::default();
        let first = serde_json::to_string(&engine.score(&facts)).unwrap();
        let second = serde_json::to_string(&engine.score(&facts)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flagged_additives_match_input_length() {
        let facts = ProductFacts {
            additive_tags: tags(&["en:e330", "en:e330", "en:e102", "unknown-tag"]),
            ..Default::default()
        };
        let result = ScoringEngine::default().score(&facts);
        assert_eq!(
            result.breakdown.additives.flagged_additives.len(),
            facts.additive_tags.len()
        );
    }

    #[test]
    fn test_score_result_json_shape() {
        let facts = ProductFacts {
            additive_tags: tags(&["en:e171"]),
            ..Default::default()
        };
        let value = serde_json::to_value(ScoringEngine::default().score(&facts)).unwrap();

        assert_eq!(value["total"], 75);
        assert_eq!(value["grade"], "good");
        assert_eq!(value["breakdown"]["nutrition"]["score"], 80);
        assert_eq!(value["breakdown"]["nutrition"]["details"]["sugarPoints"], 0);
        assert_eq!(value["breakdown"]["additives"]["penalty"], 10);
        assert_eq!(
            value["breakdown"]["additives"]["flaggedAdditives"][0]["severity"],
            "high"
        );
        assert_eq!(value["breakdown"]["allergenPenalty"], 0);
        assert_eq!(value["breakdown"]["organicBonus"], 0);
    }
}
