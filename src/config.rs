use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::enrich::DEFAULT_MAX_FAILURE_SAMPLES;
use crate::venue::COFFEE_SHOP;

/// Environment variable naming the config file when no path is passed.
pub const CONFIG_ENV: &str = "MOSCOW_VENUES_CONFIG";

/// Report parameters, read from an optional JSON file.
///
/// Every key is optional:
/// ```json
/// {
///   "top_chains": 15,
///   "top_streets": 15,
///   "seats_outlier_threshold": 800,
///   "coffee_category": "кофейня",
///   "cup_price_outlier_threshold": 1400.0,
///   "target_district": "Юго-Западный административный округ",
///   "max_failure_samples": 20
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Number of chains listed in the popularity ranking.
    pub top_chains: usize,
    /// Number of streets listed in the street ranking.
    pub top_streets: usize,
    /// Venues with this many seats or more are left out of seat medians.
    pub seats_outlier_threshold: u32,
    pub coffee_category: String,
    /// Cup prices at or above this are left out of the price spread listing.
    pub cup_price_outlier_threshold: f64,
    /// District searched for streets with a single coffee shop.
    pub target_district: String,
    pub max_failure_samples: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_chains: 15,
            top_streets: 15,
            seats_outlier_threshold: 800,
            coffee_category: COFFEE_SHOP.to_string(),
            cup_price_outlier_threshold: 1400.0,
            target_district: "Юго-Западный административный округ".to_string(),
            max_failure_samples: DEFAULT_MAX_FAILURE_SAMPLES,
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Picks the config path: `explicit` if given, else the value of
    /// [`CONFIG_ENV`].
    pub fn resolve_path(explicit: Option<PathBuf>, env_value: Option<OsString>) -> Option<PathBuf> {
        explicit.or_else(|| env_value.map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ReportConfig::from_json(r#"{"top_streets": 5}"#).unwrap();
        assert_eq!(config.top_streets, 5);
        assert_eq!(config.top_chains, 15);
        assert_eq!(config.coffee_category, "кофейня");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(ReportConfig::from_json(r#"{"top_street": 5}"#).is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = ReportConfig::load_or_default(None).unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_explicit_path_wins_over_environment() {
        let explicit = ReportConfig::resolve_path(
            Some(PathBuf::from("flag.json")),
            Some(OsString::from("env.json")),
        );
        assert_eq!(explicit, Some(PathBuf::from("flag.json")));

        let fallback = ReportConfig::resolve_path(None, Some(OsString::from("env.json")));
        assert_eq!(fallback, Some(PathBuf::from("env.json")));

        assert_eq!(ReportConfig::resolve_path(None, None), None);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("moscow_venues_test_config.json");
        std::fs::write(&path, r#"{"target_district": "Центральный административный округ"}"#)
            .unwrap();

        let config = ReportConfig::load(&path).unwrap();
        assert_eq!(config.target_district, "Центральный административный округ");

        std::fs::remove_file(&path).unwrap();
    }
}
