use serde::{Deserialize, Serialize};

use crate::off::DEFAULT_BASE_URL;
use crate::scoring::ScoringConfig;

pub const DEFAULT_CACHE_TTL: &str = "1h";
pub const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

impl Config {
    /// Fully populated configuration, as written by `config init`
    pub fn defaults() -> Self {
        Self {
            scoring: Some(ScoringConfig::default()),
            cache: Some(CacheConfig {
                enabled: Some(true),
                ttl: Some(DEFAULT_CACHE_TTL.to_string()),
            }),
            api: Some(ApiConfig {
                base_url: Some(DEFAULT_BASE_URL.to_string()),
                timeout: Some(DEFAULT_TIMEOUT.to_string()),
            }),
        }
    }
}

/// Scan result caching
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// How long a scan stays cached, e.g. "1h", "30m"
    #[serde(default)]
    pub ttl: Option<String>,
}

/// Open Food Facts API access
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout, e.g. "10s"
    #[serde(default)]
    pub timeout: Option<String>,
}
