use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields requested from the product endpoint
pub const PRODUCT_FIELDS: &[&str] = &[
    "product_name",
    "product_name_fr",
    "generic_name",
    "generic_name_fr",
    "brands",
    "image_front_url",
    "image_url",
    "nutriments",
    "additives_tags",
    "allergens",
    "allergens_tags",
    "labels_tags",
    "categories_tags",
];

/// API envelope: `{"status": 1, "product": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct OffResponse {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub product: Option<OffProduct>,
}

impl OffResponse {
    pub fn into_product(self) -> Option<OffProduct> {
        let found = self.status.as_i64() == Some(1) || self.status.as_str() == Some("1");
        if found {
            self.product
        } else {
            None
        }
    }
}

/// The subset of an Open Food Facts product the scanner uses.
///
/// The upstream data is inconsistently populated, so every field is optional
/// and tag arrays tolerate `null` or junk entries. A mis-typed text field
/// reads as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OffProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name_fr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub generic_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub generic_name_fr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub brands: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_front_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub nutriments: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub additives_tags: Vec<String>,
    /// Free text, comma separated (`"en:milk,en:eggs"`)
    #[serde(default, deserialize_with = "lenient_string")]
    pub allergens: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub allergens_tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub labels_tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub categories_tags: Vec<String>,
}

impl OffProduct {
    /// Read a nutriment as a number. Numeric strings are accepted; anything
    /// else (null, text, objects, NaN) is treated as absent.
    pub fn nutriment(&self, key: &str) -> Option<f64> {
        let value = match self.nutriments.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(tags)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
