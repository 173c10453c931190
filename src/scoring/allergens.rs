use serde::{Deserialize, Serialize};

use crate::product::ProductFacts;

/// Commonly regulated allergens whose presence triggers the allergen penalty
pub const ALLERGENS_OF_CONCERN: &[&str] = &[
    "milk",
    "eggs",
    "fish",
    "crustaceans",
    "shellfish",
    "tree-nuts",
    "peanuts",
    "soy",
    "wheat",
    "gluten",
    "sesame",
    "sulfites",
    "mustard",
    "lupin",
    "celery",
];

const ORGANIC_MARKERS: &[&str] = &["organic", "bio"];

/// Flat score adjustments applied after the weighted sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustments {
    /// Added when the product carries an organic label (>= 0)
    pub organic_bonus: i8,
    /// Added when a concern allergen is present (<= 0)
    pub allergen_penalty: i8,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            organic_bonus: 5,
            allergen_penalty: -5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenEvaluation {
    pub allergen_penalty: i8,
    pub organic_bonus: i8,
    pub is_organic: bool,
    pub has_concerning_allergen: bool,
}

/// Evaluate allergen and label tags. The penalty is binary: one concern
/// allergen costs the same as five.
pub fn evaluate(facts: &ProductFacts, adjustments: &Adjustments) -> AllergenEvaluation {
    let has_concerning_allergen = has_concerning_allergen(&facts.allergen_tags);
    let is_organic = is_organic(&facts.label_tags);

    AllergenEvaluation {
        allergen_penalty: if has_concerning_allergen {
            adjustments.allergen_penalty.min(0)
        } else {
            0
        },
        organic_bonus: if is_organic {
            adjustments.organic_bonus.max(0)
        } else {
            0
        },
        is_organic,
        has_concerning_allergen,
    }
}

/// Case-insensitive substring match, so `en:milk` and `Milk` both count.
pub fn has_concerning_allergen(allergen_tags: &[String]) -> bool {
    allergen_tags.iter().any(|tag| {
        let tag = tag.trim().to_lowercase();
        ALLERGENS_OF_CONCERN.iter().any(|allergen| tag.contains(allergen))
    })
}

pub fn is_organic(label_tags: &[String]) -> bool {
    label_tags.iter().any(|label| {
        let label = label.to_lowercase();
        ORGANIC_MARKERS.iter().any(|marker| label.contains(marker))
    })
}
