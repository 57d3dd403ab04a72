//! Import configuration.
//!
//! Defaults reproduce the stock import behavior. A TOML file and
//! environment variables can override them:
//!
//! ```toml
//! synthesize_missing_profiles = true
//!
//! [placeholder]
//! duration_minutes = 30.0
//! max_depth_m = 18.0
//! avg_depth_m = 10.0
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};
use crate::synthetic;

pub const ENV_SYNTHESIZE: &str = "DIVELOG_SYNTHESIZE_PROFILES";
pub const ENV_PLACEHOLDER_DURATION: &str = "DIVELOG_PLACEHOLDER_DURATION_MIN";
pub const ENV_PLACEHOLDER_MAX_DEPTH: &str = "DIVELOG_PLACEHOLDER_MAX_DEPTH_M";
pub const ENV_PLACEHOLDER_AVG_DEPTH: &str = "DIVELOG_PLACEHOLDER_AVG_DEPTH_M";

/// Summary stats given to an XML dive that carries no usable profile points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderStats {
    #[serde(default = "default_placeholder_duration")]
    pub duration_minutes: f64,
    #[serde(default = "default_placeholder_max_depth")]
    pub max_depth_m: f64,
    #[serde(default = "default_placeholder_avg_depth")]
    pub avg_depth_m: f64,
}

fn default_placeholder_duration() -> f64 {
    30.0
}

fn default_placeholder_max_depth() -> f64 {
    18.0
}

fn default_placeholder_avg_depth() -> f64 {
    10.0
}

impl Default for PlaceholderStats {
    fn default() -> Self {
        Self {
            duration_minutes: default_placeholder_duration(),
            max_depth_m: default_placeholder_max_depth(),
            avg_depth_m: default_placeholder_avg_depth(),
        }
    }
}

impl PlaceholderStats {
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_minutes * 60.0).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Attach a synthetic profile to every dive that has no samples.
    #[serde(default = "default_synthesize")]
    pub synthesize_missing_profiles: bool,
    #[serde(default)]
    pub placeholder: PlaceholderStats,
}

fn default_synthesize() -> bool {
    true
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            synthesize_missing_profiles: default_synthesize(),
            placeholder: PlaceholderStats::default(),
        }
    }
}

impl ImportConfig {
    pub fn from_toml_str(text: &str) -> ImportResult<Self> {
        let config: ImportConfig =
            toml::from_str(text).map_err(|e| ImportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ImportError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        if config.validate().is_err() {
            tracing::warn!("ignoring invalid placeholder overrides from environment");
            config.placeholder = PlaceholderStats::default();
        }
        config
    }

    /// Apply overrides from a key lookup. Unparsable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup(ENV_SYNTHESIZE).and_then(|v| parse_flag(&v)) {
            self.synthesize_missing_profiles = flag;
        }
        let numeric = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());
        if let Some(v) = numeric(ENV_PLACEHOLDER_DURATION) {
            self.placeholder.duration_minutes = v;
        }
        if let Some(v) = numeric(ENV_PLACEHOLDER_MAX_DEPTH) {
            self.placeholder.max_depth_m = v;
        }
        if let Some(v) = numeric(ENV_PLACEHOLDER_AVG_DEPTH) {
            self.placeholder.avg_depth_m = v;
        }
    }

    pub fn validate(&self) -> ImportResult<()> {
        let p = &self.placeholder;
        let finite = [p.duration_minutes, p.max_depth_m, p.avg_depth_m]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !finite {
            return Err(ImportError::Config(
                "placeholder values must be finite and non-negative".to_string(),
            ));
        }
        if p.duration_minutes > synthetic::MAX_TOTAL_MINUTES {
            return Err(ImportError::Config(format!(
                "placeholder duration {} min exceeds {} min",
                p.duration_minutes,
                synthetic::MAX_TOTAL_MINUTES
            )));
        }
        if p.avg_depth_m > p.max_depth_m {
            return Err(ImportError::Config(format!(
                "placeholder average depth {} exceeds max depth {}",
                p.avg_depth_m, p.max_depth_m
            )));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ImportConfig::default();
        assert!(cfg.synthesize_missing_profiles);
        assert_eq!(cfg.placeholder.duration_minutes, 30.0);
        assert_eq!(cfg.placeholder.max_depth_m, 18.0);
        assert_eq!(cfg.placeholder.avg_depth_m, 10.0);
        assert_eq!(cfg.placeholder.duration(), Duration::from_secs(1800));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = ImportConfig::from_toml_str("[placeholder]\nmax_depth_m = 25.0\n").unwrap();
        assert!(cfg.synthesize_missing_profiles);
        assert_eq!(cfg.placeholder.max_depth_m, 25.0);
        assert_eq!(cfg.placeholder.duration_minutes, 30.0);

        let cfg = ImportConfig::from_toml_str("synthesize_missing_profiles = false").unwrap();
        assert!(!cfg.synthesize_missing_profiles);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ImportConfig::from_toml_str("synthesize_missing_profiles = 3"),
            Err(ImportError::Config(_))
        ));
        assert!(ImportConfig::from_toml_str(
            "[placeholder]\nmax_depth_m = 5.0\navg_depth_m = 8.0\n"
        )
        .is_err());
        assert!(matches!(
            ImportConfig::from_toml_str("[placeholder]\nduration_minutes = 1e12\n"),
            Err(ImportError::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SYNTHESIZE, "off"),
            (ENV_PLACEHOLDER_DURATION, "45"),
            (ENV_PLACEHOLDER_MAX_DEPTH, "not a number"),
        ]
        .into_iter()
        .collect();

        let mut cfg = ImportConfig::default();
        cfg.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(!cfg.synthesize_missing_profiles);
        assert_eq!(cfg.placeholder.duration_minutes, 45.0);
        assert_eq!(cfg.placeholder.max_depth_m, 18.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[placeholder]\nduration_minutes = 42.0").unwrap();

        let cfg = ImportConfig::load(&path).unwrap();
        assert_eq!(cfg.placeholder.duration_minutes, 42.0);

        assert!(matches!(
            ImportConfig::load(dir.path().join("missing.toml")),
            Err(ImportError::Unreadable { .. })
        ));
    }
}
