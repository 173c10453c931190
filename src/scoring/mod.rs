pub mod additives;
pub mod allergens;
pub mod breakpoints;
pub mod config;
pub mod engine;
pub mod nutrition;
pub mod validation;

pub use additives::{AdditivePolicy, AdditiveScore, AdditiveScorer, FlaggedAdditive, RiskTables, Severity};
pub use allergens::{Adjustments, AllergenEvaluation};
pub use breakpoints::{classify, BreakpointMode};
pub use config::*;
pub use engine::{is_pure_water, score_product, Grade, GradeScale, ScoreBreakdown, ScoreResult, ScoringEngine};
pub use nutrition::{compute_nutrition_score, NutritionPoints, NutritionScore};
pub use validation::validate_scoring;
