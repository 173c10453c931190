use serde::{Deserialize, Serialize};

/// Nutrient values per 100g. `None` means the value is unknown, which is
/// not the same as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrients {
    pub energy_kcal: Option<f64>,
    pub sugars: Option<f64>,
    pub saturated_fat: Option<f64>,
    /// Milligrams, not grams
    pub sodium_mg: Option<f64>,
    pub fiber: Option<f64>,
    pub protein: Option<f64>,
}

impl Nutrients {
    /// True when every nutrient is unknown
    pub fn is_empty(&self) -> bool {
        self.energy_kcal.is_none()
            && self.sugars.is_none()
            && self.saturated_fat.is_none()
            && self.sodium_mg.is_none()
            && self.fiber.is_none()
            && self.protein.is_none()
    }
}

/// Everything the scorer needs to know about one packaged product.
///
/// Tags are expected in normalized form (`en:e150c`, `en:milk`,
/// `en:organic`, `en:mineral-waters`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFacts {
    pub nutrients: Nutrients,
    /// Ordered, duplicates allowed
    pub additive_tags: Vec<String>,
    pub allergen_tags: Vec<String>,
    pub label_tags: Vec<String>,
    pub category_tags: Vec<String>,
}
