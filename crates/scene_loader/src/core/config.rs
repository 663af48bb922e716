//! # Loader Configuration
//!
//! Configuration for the scene load queue and for applications that drive it.
//! Both types serialize to TOML or RON through the [`Config`] trait.
//!
//! The defaults reproduce the engine's observed behavior: activation is
//! triggered once staging progress reaches `0.9`, and a scene that never gets
//! there stalls the queue forever. Timeouts are opt-in.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// Staging progress at which a scene counts as fully staged
///
/// Hosts report staged content slightly before `1.0`; the remainder is the
/// activation itself.
pub const DEFAULT_ACTIVATION_THRESHOLD: f32 = 0.9;

/// # Load Queue Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Progress value in `(0, 1]` that must be reached before activation
    pub activation_threshold: f32,
    /// Fail a request when one of its scenes is still staging after this many ticks
    pub staging_timeout_ticks: Option<u32>,
    /// Fail a request when an activation notice does not arrive within this many ticks
    pub activation_timeout_ticks: Option<u32>,
}

impl LoaderConfig {
    /// Create a configuration with the engine defaults
    pub const fn new() -> Self {
        Self {
            activation_threshold: DEFAULT_ACTIVATION_THRESHOLD,
            staging_timeout_ticks: None,
            activation_timeout_ticks: None,
        }
    }

    /// Set the staging progress threshold
    pub const fn with_activation_threshold(mut self, threshold: f32) -> Self {
        self.activation_threshold = threshold;
        self
    }

    /// Give up on scenes that stage for longer than `ticks`
    pub const fn with_staging_timeout(mut self, ticks: u32) -> Self {
        self.staging_timeout_ticks = Some(ticks);
        self
    }

    /// Give up on activations that are not confirmed within `ticks`
    pub const fn with_activation_timeout(mut self, ticks: u32) -> Self {
        self.activation_timeout_ticks = Some(ticks);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.activation_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "activation threshold must be in (0, 1], got {threshold}"
            )));
        }

        if self.staging_timeout_ticks == Some(0) {
            return Err(ConfigError::Invalid(
                "staging timeout must be at least 1 tick".to_string(),
            ));
        }

        if self.activation_timeout_ticks == Some(0) {
            return Err(ConfigError::Invalid(
                "activation timeout must be at least 1 tick".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for LoaderConfig {}

/// # Application Configuration
///
/// Top-level configuration for a program that owns a host and a load queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Fallback log filter when `RUST_LOG` is not set
    pub log_level: String,
    /// Upper bound on host ticks before the application gives up waiting
    pub max_ticks: u64,
    /// Load queue configuration
    pub loader: LoaderConfig,
}

impl ApplicationConfig {
    /// Create a new application configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_ticks: 600,
            loader: LoaderConfig::default(),
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid("max_ticks must be at least 1".to_string()));
        }
        self.loader.validate()
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        let dir = std::env::temp_dir();
        let file = format!("scene_loader_{}_{}", std::process::id(), name);
        dir.join(file).to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults_match_engine_behavior() {
        let config = LoaderConfig::default();
        assert_eq!(config.activation_threshold, 0.9);
        assert!(config.staging_timeout_ticks.is_none());
        assert!(config.activation_timeout_ticks.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(LoaderConfig::new().with_activation_threshold(0.0).validate().is_err());
        assert!(LoaderConfig::new().with_activation_threshold(1.5).validate().is_err());
        assert!(LoaderConfig::new().with_activation_threshold(f32::NAN).validate().is_err());
        assert!(LoaderConfig::new().with_activation_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        assert!(LoaderConfig::new().with_staging_timeout(0).validate().is_err());
        assert!(LoaderConfig::new().with_activation_timeout(0).validate().is_err());
        assert!(LoaderConfig::new().with_staging_timeout(30).validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ApplicationConfig = toml::from_str(
            r#"
            log_level = "debug"

            [loader]
            staging_timeout_ticks = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_ticks, 600);
        assert_eq!(config.loader.activation_threshold, 0.9);
        assert_eq!(config.loader.staging_timeout_ticks, Some(120));
        assert!(config.loader.activation_timeout_ticks.is_none());
    }

    #[test]
    fn test_save_and_load_toml_file() {
        let path = temp_path("loader.toml");
        let config = LoaderConfig::new().with_activation_timeout(4);

        config.save_to_file(&path).unwrap();
        let loaded = LoaderConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let path = temp_path("app.ron");
        let config = ApplicationConfig::new().with_log_level("trace");

        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = LoaderConfig::default().save_to_file("loader.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
