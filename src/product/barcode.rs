use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MIN_LEN: usize = 8;
const MAX_LEN: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid barcode '{input}': expected 8-20 digits")]
pub struct InvalidBarcode {
    pub input: String,
}

/// A normalized barcode: whitespace removed, 8-20 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Barcode(String);

impl Barcode {
    pub fn parse(input: &str) -> Result<Self, InvalidBarcode> {
        let normalized: String = input.chars().filter(|c| !c.is_whitespace()).collect();

        let valid_len = (MIN_LEN..=MAX_LEN).contains(&normalized.len());
        if !valid_len || !normalized.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidBarcode {
                input: input.to_string(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
