mod init;
mod schema;

pub use init::write_default_config;
pub use schema::{ApiConfig, CacheConfig, Config, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::off::DEFAULT_BASE_URL;
use crate::scan::DEFAULT_TTL;
use crate::scoring::{validate_scoring, ScoringConfig};

/// Overrides the API base URL
pub const ENV_API_BASE: &str = "OFF_API_BASE";
/// Overrides the cache TTL, in seconds
pub const ENV_CACHE_TTL: &str = "SCANNER_CACHE_TTL";

/// Get the config directory path (~/.config/shelf-score/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("shelf-score"))
        .unwrap_or_else(|| PathBuf::from(".shelf-score"))
}

/// Get the default config file path (~/.config/shelf-score/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path,
///   and a missing default file means built-in defaults.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Effective runtime settings after defaults and environment overrides
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub scoring: ScoringConfig,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub base_url: String,
    pub timeout: Duration,
}

impl Settings {
    /// Render back as a fully populated config (for `config show`)
    pub fn to_config(&self) -> Config {
        Config {
            scoring: Some(self.scoring.clone()),
            cache: Some(CacheConfig {
                enabled: Some(self.cache_enabled),
                ttl: Some(humantime::format_duration(self.cache_ttl).to_string()),
            }),
            api: Some(ApiConfig {
                base_url: Some(self.base_url.clone()),
                timeout: Some(humantime::format_duration(self.timeout).to_string()),
            }),
        }
    }
}

/// Validate the whole configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref scoring) = config.scoring {
        if let Err(scoring_errors) = validate_scoring(scoring) {
            errors.extend(scoring_errors);
        }
    }

    if let Some(ttl) = config.cache.as_ref().and_then(|c| c.ttl.as_ref()) {
        if let Err(e) = humantime::parse_duration(ttl) {
            errors.push(format!("cache.ttl: invalid duration '{}' - {}", ttl, e));
        }
    }

    if let Some(ref api) = config.api {
        if let Some(ref timeout) = api.timeout {
            match humantime::parse_duration(timeout) {
                Ok(d) if d.is_zero() => errors.push("api.timeout: must be greater than zero".to_string()),
                Ok(_) => {}
                Err(e) => errors.push(format!("api.timeout: invalid duration '{}' - {}", timeout, e)),
            }
        }
        if let Some(ref base_url) = api.base_url {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                errors.push(format!("api.base_url: must be an http(s) URL, got '{}'", base_url));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Resolve settings using the process environment
pub fn resolve(config: &Config) -> Result<Settings> {
    resolve_with(config, |key| std::env::var(key).ok())
}

/// Resolve settings with an explicit environment lookup
pub fn resolve_with<F>(config: &Config, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let cache = config.cache.clone().unwrap_or_default();
    let api = config.api.clone().unwrap_or_default();

    let cache_ttl = match env(ENV_CACHE_TTL) {
        Some(secs) => {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_CACHE_TTL, secs))?;
            Duration::from_secs(secs)
        }
        None => match cache.ttl.as_deref() {
            Some(ttl) => humantime::parse_duration(ttl).with_context(|| format!("Invalid cache.ttl '{}'", ttl))?,
            None => DEFAULT_TTL,
        },
    };

    let timeout_str = api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT);
    let timeout = humantime::parse_duration(timeout_str)
        .with_context(|| format!("Invalid api.timeout '{}'", timeout_str))?;

    let base_url = env(ENV_API_BASE)
        .filter(|url| !url.trim().is_empty())
        .or(api.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Ok(Settings {
        scoring: config.scoring.clone().unwrap_or_default(),
        cache_enabled: cache.enabled.unwrap_or(true),
        cache_ttl,
        base_url,
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = resolve_with(&Config::default(), no_env).unwrap();

        assert_eq!(settings.scoring, ScoringConfig::default());
        assert!(settings.cache_enabled);
        assert_eq!(settings.cache_ttl, Duration::from_secs(3600));
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_resolve_from_yaml() {
        let yaml = r#"
cache:
  enabled: false
  ttl: "30m"
api:
  base_url: "https://off.example.test/api/v2"
  timeout: "2s"
scoring:
  organic_bonus: 3
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let settings = resolve_with(&config, no_env).unwrap();

        assert!(!settings.cache_enabled);
        assert_eq!(settings.cache_ttl, Duration::from_secs(1800));
        assert_eq!(settings.base_url, "https://off.example.test/api/v2");
        assert_eq!(settings.timeout, Duration::from_secs(2));
        assert_eq!(settings.scoring.organic_bonus, Some(3));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_BASE, "http://localhost:8080/api/v2"),
            (ENV_CACHE_TTL, "120"),
        ]
        .into_iter()
        .collect();
        let config = Config::defaults();
        let settings = resolve_with(&config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.base_url, "http://localhost:8080/api/v2");
        assert_eq!(settings.cache_ttl, Duration::from_secs(120));
    }

    #[test]
    fn test_bad_env_ttl_is_error() {
        let result = resolve_with(&Config::default(), |k| {
            (k == ENV_CACHE_TTL).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&Config::defaults()).is_ok());
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let yaml = r#"
cache:
  ttl: "forever"
api:
  base_url: "ftp://example.test"
  timeout: "0s"
scoring:
  weights: { nutrition: 0.8, additives: 0.8 }
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.starts_with("scoring.weights")));
        assert!(errors.iter().any(|e| e.starts_with("cache.ttl")));
        assert!(errors.iter().any(|e| e.starts_with("api.timeout")));
        assert!(errors.iter().any(|e| e.starts_with("api.base_url")));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("queries: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_roundtrip_through_config() {
        let settings = resolve_with(&Config::defaults(), no_env).unwrap();
        let again = resolve_with(&settings.to_config(), no_env).unwrap();
        assert_eq!(settings, again);
    }

    #[test]
    fn test_load_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(dir.path().join("missing.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "cache:\n  ttl: \"5m\"\n").unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.cache.unwrap().ttl.as_deref(), Some("5m"));
        assert!(config.scoring.is_none());
    }

    #[test]
    fn test_load_invalid_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "cache: [not, a, map").unwrap();

        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }
}
