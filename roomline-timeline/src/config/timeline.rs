use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, str::FromStr, time::Duration};
use tracing::level_filters::LevelFilter;

use crate::errors::ConfigError;

const ENV_DEBOUNCE_MS: &str = "ROOMLINE_DEBOUNCE_MS";
const ENV_CHANNEL_CAPACITY: &str = "ROOMLINE_CHANNEL_CAPACITY";
const ENV_LOG_LEVEL: &str = "ROOMLINE_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "ROOMLINE_LOG_FORMAT";

const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Output format of the log subscriber installed by binaries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected 'text' or 'json'")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedFormat`] for anything but yaml, yml,
    /// json and toml.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or(ConfigError::UnsupportedFormat)
            .and_then(Self::from_str)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat),
        }
    }
}

/// Settings for one or more timeline providers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimelineConfig {
    /// Length of the diff collection window in milliseconds.
    pub debounce_window_ms: u64,

    /// Buffered updates per subscriber before slow subscribers start lagging.
    pub update_channel_capacity: usize,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TimelineConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            debounce_window_ms: 100,
            update_channel_capacity: 64,
            logging: LoggingConfig::default(),
        }
    }

    #[must_use]
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    /// Debounce window a provider actually uses, capped at the supported
    /// maximum.
    #[must_use]
    pub fn effective_debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms.min(MAX_DEBOUNCE_MS))
    }

    /// Update channel capacity a provider actually uses; never zero.
    #[must_use]
    pub fn effective_channel_capacity(&self) -> usize {
        self.update_channel_capacity.max(1)
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a yaml, json or toml file.
    /// * `window_override` - Optional debounce window that wins over everything else.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable is malformed, or the resolved configuration is invalid.
    pub fn load_config(
        config_path: Option<&Path>,
        window_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides()?;

        if let Some(window) = window_override {
            config.debounce_window_ms = window;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Parses a configuration file; missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, has an unsupported
    /// extension, or fails to parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parses configuration text in the given format.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the content is malformed.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Yaml => {
                serde_yml::from_str(content).map_err(|err| ConfigError::parse("yaml", &err))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|err| ConfigError::parse("json", &err))
            }
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|err| ConfigError::parse("toml", &err))
            }
        }
    }

    /// Renders the configuration in the given format.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Yaml => {
                serde_yml::to_string(self).map_err(|err| ConfigError::parse("yaml", &err))
            }
            ConfigFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|err| ConfigError::parse("json", &err))
            }
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|err| ConfigError::parse("toml", &err))
            }
        }
    }

    /// Applies `ROOMLINE_*` variables to values still at their defaults.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let defaults = Self::with_defaults();

        if self.debounce_window_ms == defaults.debounce_window_ms {
            if let Ok(value) = env::var(ENV_DEBOUNCE_MS) {
                self.debounce_window_ms = value.parse().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_DEBOUNCE_MS,
                    message: format!("'{value}' is not a number of milliseconds"),
                })?;
            }
        }
        if self.update_channel_capacity == defaults.update_channel_capacity {
            if let Ok(value) = env::var(ENV_CHANNEL_CAPACITY) {
                self.update_channel_capacity =
                    value.parse().map_err(|_| ConfigError::InvalidEnv {
                        var: ENV_CHANNEL_CAPACITY,
                        message: format!("'{value}' is not a positive integer"),
                    })?;
            }
        }
        if self.logging.level == defaults.logging.level {
            if let Ok(level) = env::var(ENV_LOG_LEVEL) {
                self.logging.level = level;
            }
        }
        if self.logging.format == defaults.logging.format {
            if let Ok(value) = env::var(ENV_LOG_FORMAT) {
                self.logging.format = value
                    .parse()
                    .map_err(|message| ConfigError::InvalidEnv {
                        var: ENV_LOG_FORMAT,
                        message,
                    })?;
            }
        }

        Ok(())
    }

    /// Validate the resolved configuration
    ///
    /// # Errors
    /// Returns every validation failure found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.update_channel_capacity == 0 {
            errors.push("update_channel_capacity must be greater than 0".to_string());
        }
        if self.debounce_window_ms > MAX_DEBOUNCE_MS {
            errors.push(format!(
                "debounce_window_ms must be at most {MAX_DEBOUNCE_MS}, got {}",
                self.debounce_window_ms
            ));
        }
        if self.logging.level.parse::<LevelFilter>().is_err() {
            errors.push(format!("unknown log level '{}'", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var(ENV_DEBOUNCE_MS);
            env::remove_var(ENV_CHANNEL_CAPACITY);
            env::remove_var(ENV_LOG_LEVEL);
            env::remove_var(ENV_LOG_FORMAT);
        }
    }

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_with_defaults() {
        let config = TimelineConfig::with_defaults();

        assert_eq!(config.debounce_window_ms, 100);
        assert_eq!(config.debounce_window(), Duration::from_millis(100));
        assert_eq!(config.update_channel_capacity, 64);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_config_without_file() {
        cleanup_env_vars();
        let config = TimelineConfig::load_config(None, None).unwrap();
        assert_eq!(config, TimelineConfig::with_defaults());
    }

    #[test]
    #[serial]
    fn test_load_config_from_each_format() {
        cleanup_env_vars();
        let dir = TempDir::new().unwrap();

        let yaml = write_config(
            &dir,
            "config.yaml",
            "debounce_window_ms: 250\nlogging:\n  level: debug\n  format: json\n",
        );
        let json = write_config(&dir, "config.json", r#"{ "update_channel_capacity": 8 }"#);
        let toml = write_config(&dir, "config.toml", "debounce_window_ms = 40\n");

        let config = TimelineConfig::load_config(Some(&yaml), None).unwrap();
        assert_eq!(config.debounce_window_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        let config = TimelineConfig::load_config(Some(&json), None).unwrap();
        assert_eq!(config.update_channel_capacity, 8);
        assert_eq!(config.debounce_window_ms, 100);

        let config = TimelineConfig::load_config(Some(&toml), None).unwrap();
        assert_eq!(config.debounce_window_ms, 40);
    }

    #[test]
    #[serial]
    fn test_load_config_with_environment_variables() {
        cleanup_env_vars();
        unsafe {
            env::set_var(ENV_DEBOUNCE_MS, "20");
            env::set_var(ENV_CHANNEL_CAPACITY, "4");
            env::set_var(ENV_LOG_LEVEL, "trace");
            env::set_var(ENV_LOG_FORMAT, "JSON");
        }

        let config = TimelineConfig::load_config(None, None).unwrap();
        assert_eq!(config.debounce_window_ms, 20);
        assert_eq!(config.update_channel_capacity, 4);
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormat::Json);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_file_values_win_over_environment() {
        cleanup_env_vars();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.yml", "debounce_window_ms: 300\n");
        unsafe {
            env::set_var(ENV_DEBOUNCE_MS, "20");
        }

        let config = TimelineConfig::load_config(Some(&path), None).unwrap();
        assert_eq!(config.debounce_window_ms, 300);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_window_override_precedence() {
        cleanup_env_vars();
        unsafe {
            env::set_var(ENV_DEBOUNCE_MS, "20");
        }

        let config = TimelineConfig::load_config(None, Some(5)).unwrap();
        assert_eq!(config.debounce_window_ms, 5);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_environment_value() {
        cleanup_env_vars();
        unsafe {
            env::set_var(ENV_DEBOUNCE_MS, "soon");
        }

        let err = TimelineConfig::load_config(None, None).unwrap_err();
        assert!(err.to_string().contains("Invalid ROOMLINE_DEBOUNCE_MS"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_validation_failures_are_collected() {
        cleanup_env_vars();
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "config.json",
            r#"{ "update_channel_capacity": 0, "debounce_window_ms": 600000, "logging": { "level": "loud" } }"#,
        );

        match TimelineConfig::load_config(Some(&path), None) {
            Err(ConfigError::Invalid(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_effective_values_are_clamped() {
        let config = TimelineConfig {
            debounce_window_ms: u64::MAX,
            update_channel_capacity: 0,
            ..TimelineConfig::with_defaults()
        };
        assert_eq!(
            config.effective_debounce_window(),
            Duration::from_millis(MAX_DEBOUNCE_MS)
        );
        assert_eq!(config.effective_channel_capacity(), 1);

        let defaults = TimelineConfig::with_defaults();
        assert_eq!(defaults.effective_debounce_window(), defaults.debounce_window());
        assert_eq!(defaults.effective_channel_capacity(), 64);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = TimelineConfig::from_file(Path::new("config.ini"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat)));
    }

    #[test]
    fn test_malformed_file_reports_format() {
        let err = TimelineConfig::parse("debounce_window_ms: [", ConfigFormat::Yaml).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse yaml configuration"));
    }

    #[test]
    fn test_render_round_trips_every_format() {
        let config = TimelineConfig::with_defaults();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let rendered = config.render(format).unwrap();
            assert_eq!(
                TimelineConfig::parse(&rendered, format).unwrap(),
                config,
                "{}",
                format.as_str()
            );
        }
    }
}
