use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::types::OffProduct;
use crate::product::{Nutrients, ProductFacts};

const KJ_PER_KCAL: f64 = 4.184;
const SALT_PER_SODIUM: f64 = 2.5;
const MG_PER_G: f64 = 1000.0;

const UNNAMED_PRODUCT: &str = "Unnamed product";
const UNKNOWN_BRAND: &str = "Unknown brand";

/// Display information about a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub name: String,
    pub brand: String,
    pub image_url: Option<String>,
}

/// Map an Open Food Facts product onto the scorer's input.
///
/// Units are normalized here: energy to kcal, sodium to milligrams.
pub fn to_facts(product: &OffProduct) -> ProductFacts {
    let nutrients = Nutrients {
        energy_kcal: energy_kcal(product),
        sugars: product.nutriment("sugars_100g"),
        saturated_fat: product.nutriment("saturated-fat_100g"),
        sodium_mg: sodium_mg(product),
        fiber: product.nutriment("fiber_100g"),
        protein: product.nutriment("proteins_100g"),
    };

    ProductFacts {
        nutrients,
        additive_tags: product.additives_tags.clone(),
        allergen_tags: allergen_tags(product),
        label_tags: product.labels_tags.clone(),
        category_tags: product.categories_tags.clone(),
    }
}

pub fn summarize(product: &OffProduct) -> ProductSummary {
    let name = [
        &product.product_name_fr,
        &product.product_name,
        &product.generic_name_fr,
        &product.generic_name,
    ]
    .into_iter()
    .find_map(non_blank)
    .unwrap_or(UNNAMED_PRODUCT)
    .to_string();

    let brand = non_blank(&product.brands).unwrap_or(UNKNOWN_BRAND).to_string();

    let image_url = non_blank(&product.image_front_url)
        .or_else(|| non_blank(&product.image_url))
        .map(str::to_string);

    ProductSummary {
        name,
        brand,
        image_url,
    }
}

fn energy_kcal(product: &OffProduct) -> Option<f64> {
    product.nutriment("energy-kcal_100g").or_else(|| {
        // energy_100g is reported in kJ
        product
            .nutriment("energy-kj_100g")
            .or_else(|| product.nutriment("energy_100g"))
            .map(|kj| kj / KJ_PER_KCAL)
    })
}

fn sodium_mg(product: &OffProduct) -> Option<f64> {
    product
        .nutriment("sodium_100g")
        .or_else(|| product.nutriment("salt_100g").map(|salt| salt / SALT_PER_SODIUM))
        .map(|grams| grams * MG_PER_G)
}

/// Structured tags plus the free-text list, lowercased, first occurrence kept
fn allergen_tags(product: &OffProduct) -> Vec<String> {
    let free_text = product
        .allergens
        .as_deref()
        .unwrap_or_default()
        .split(',');

    let mut seen = HashSet::new();
    product
        .allergens_tags
        .iter()
        .map(String::as_str)
        .chain(free_text)
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .map(canonical_allergen)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Rewrite OFF allergen names to the names the scorer matches on,
/// keeping the language prefix (`en:nuts` -> `en:tree-nuts`).
fn canonical_allergen(tag: String) -> String {
    let (prefix, name) = match tag.split_once(':') {
        Some((lang, name)) => (format!("{}:", lang), name),
        None => (String::new(), tag.as_str()),
    };

    let name = match name {
        "nuts" => "tree-nuts".to_string(),
        "molluscs" => "shellfish".to_string(),
        other => other.replace("sulphite", "sulfite"),
    };

    format!("{}{}", prefix, name)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
