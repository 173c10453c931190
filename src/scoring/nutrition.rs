use serde::{Deserialize, Serialize};

use super::breakpoints::{self, classify, BreakpointMode};
use crate::product::Nutrients;

/// Upper bound of the negative points (4 factors x 10)
const MAX_NEGATIVE: u8 = 40;
/// Upper bound of the raw score (40 + 2 positive factors x 5)
const MAX_RAW: f64 = 50.0;

/// Points awarded per nutrition factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPoints {
    pub energy_points: u8,
    pub sugar_points: u8,
    pub sat_fat_points: u8,
    pub sodium_points: u8,
    pub fiber_points: u8,
    pub protein_points: u8,
}

impl NutritionPoints {
    pub fn negative(&self) -> u8 {
        self.energy_points + self.sugar_points + self.sat_fat_points + self.sodium_points
    }

    pub fn positive(&self) -> u8 {
        self.fiber_points + self.protein_points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionScore {
    /// 0-100
    pub score: u8,
    pub details: NutritionPoints,
}

/// Nutri-Score style sub-score: up to 40 negative points subtracted from 40,
/// up to 10 positive points added, then scaled from 0-50 onto 0-100.
pub fn compute_nutrition_score(nutrients: &Nutrients) -> NutritionScore {
    let details = NutritionPoints {
        energy_points: classify(nutrients.energy_kcal, &breakpoints::ENERGY_KCAL, BreakpointMode::StrictGreater),
        sugar_points: classify(nutrients.sugars, &breakpoints::SUGARS_G, BreakpointMode::StrictGreater),
        sat_fat_points: classify(nutrients.saturated_fat, &breakpoints::SATURATED_FAT_G, BreakpointMode::StrictGreater),
        sodium_points: classify(nutrients.sodium_mg, &breakpoints::SODIUM_MG, BreakpointMode::StrictGreater),
        fiber_points: classify(nutrients.fiber, &breakpoints::FIBER_G, BreakpointMode::GteCumulative),
        protein_points: classify(nutrients.protein, &breakpoints::PROTEIN_G, BreakpointMode::GteCumulative),
    };

    let raw = MAX_NEGATIVE.saturating_sub(details.negative()) + details.positive();
    let normalized = (f64::from(raw) / MAX_RAW * 100.0).round().clamp(0.0, 100.0);

    NutritionScore {
        score: normalized as u8,
        details,
    }
}
