//! Tracker configuration
//!
//! Watch options handed to the platform primitives when a run starts.
//! Loaded from TOML; every key is optional and falls back to its default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for the foreground (browser-style) watch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForegroundOptions {
    /// Ask for GPS-grade fixes
    pub enable_high_accuracy: bool,
    /// Oldest cached fix accepted, in milliseconds
    pub maximum_age_ms: u64,
    /// Time allowed for each fix, in milliseconds
    pub timeout_ms: u64,
}

impl Default for ForegroundOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            maximum_age_ms: 0,
            timeout_ms: 5000,
        }
    }
}

/// Options for the native background watcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// Title of the persistent notification
    pub background_title: String,
    /// Body of the persistent notification
    pub background_message: String,
    /// Prompt for location permission when starting
    pub request_permissions: bool,
    /// Deliver cached fixes
    pub stale: bool,
    /// Minimum movement between fixes, in meters
    pub distance_filter_m: f64,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            background_title: "Location Tracking Active".to_string(),
            background_message: "TrackMaster is tracking your location".to_string(),
            request_permissions: true,
            stale: false,
            distance_filter_m: 10.0,
        }
    }
}

/// Tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub foreground: ForegroundOptions,
    pub background: BackgroundOptions,
}

impl TrackerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With foreground fix timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.foreground.timeout_ms = timeout_ms;
        self
    }

    /// With background distance filter
    #[inline]
    #[must_use]
    pub fn with_distance_filter(mut self, meters: f64) -> Self {
        self.background.distance_filter_m = meters;
        self
    }

    /// With background permission prompting
    #[inline]
    #[must_use]
    pub fn with_request_permissions(mut self, request: bool) -> Self {
        self.background.request_permissions = request;
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or wrong types
    /// - `ConfigError::InvalidValue` when a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`TrackerConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading tracker config");
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `ConfigError::Render` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.foreground.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "foreground.timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        let filter = self.background.distance_filter_m;
        if !(filter >= 0.0) || !filter.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "background.distance_filter_m",
                reason: format!("{filter} is not a non-negative distance"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_platform_options() {
        let config = TrackerConfig::new();
        assert!(config.foreground.enable_high_accuracy);
        assert_eq!(config.foreground.maximum_age_ms, 0);
        assert_eq!(config.foreground.timeout_ms, 5000);
        assert_eq!(config.background.distance_filter_m, 10.0);
        assert!(config.background.request_permissions);
        assert!(!config.background.stale);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = TrackerConfig::from_toml_str("").unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let text = r#"
            [background]
            distance_filter_m = 25.0
        "#;
        let config = TrackerConfig::from_toml_str(text).unwrap();
        assert_eq!(config.background.distance_filter_m, 25.0);
        assert_eq!(config.background.background_title, "Location Tracking Active");
        assert_eq!(config.foreground, ForegroundOptions::default());
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = TrackerConfig::from_toml_str("[foreground]\ntimeout_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "foreground.timeout_ms", .. }
        ));
    }

    #[test]
    fn rejects_negative_distance_filter() {
        let config = TrackerConfig::new().with_distance_filter(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_wrong_types() {
        let err = TrackerConfig::from_toml_str("[foreground]\ntimeout_ms = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let config = TrackerConfig::new().with_timeout_ms(9000).with_request_permissions(false);
        let text = config.to_toml_string().unwrap();
        assert_eq!(TrackerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[foreground]\ntimeout_ms = 1234").unwrap();

        let config = TrackerConfig::load(file.path()).unwrap();
        assert_eq!(config.foreground.timeout_ms, 1234);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = TrackerConfig::load("/nonexistent/trackmaster.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
