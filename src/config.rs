//! Configuration types for the alarm service.

use chime_grammar::MatchMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimeConfig {
    /// Trigger loop settings.
    pub scheduler: SchedulerConfig,
    /// Alarm text interpretation settings.
    pub interpreter: InterpreterConfig,
    /// Diagnostic output settings.
    pub logging: LoggingConfig,
}

/// Trigger loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Milliseconds between scans of the trigger set.
    pub tick_interval_ms: u64,
    /// Number of recent firings kept in memory.
    pub history_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            history_limit: 200,
        }
    }
}

impl SchedulerConfig {
    /// Scan interval as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Interpreter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// How strictly interval and delay keywords are matched.
    pub matching: MatchMode,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive. `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// Directory for daily rolling log files (None = stderr only).
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "chime=info".to_owned(),
            directory: None,
        }
    }
}

impl ChimeConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::error::ChimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ChimeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/chime/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("chime").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("chime")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/chime-config/config.toml")
        }
    }

    /// Check value ranges. A zero history limit is clamped, not rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::Config`](crate::error::ChimeError::Config) when the
    /// tick interval is zero or the log filter is empty.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err(crate::error::ChimeError::Config(
                "scheduler.tick_interval_ms must be greater than 0".to_owned(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(crate::error::ChimeError::Config(
                "logging.filter cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ChimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.scheduler.history_limit, 200);
        assert_eq!(config.interpreter.matching, MatchMode::Search);
        assert_eq!(config.logging.filter, "chime=info");
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ChimeConfig::default();
        config.scheduler.tick_interval_ms = 250;
        config.scheduler.history_limit = 10;
        config.interpreter.matching = MatchMode::WordBoundary;
        config.logging.directory = Some(dir.path().join("logs"));

        config.save_to_file(&path).unwrap();
        assert!(path.exists());

        let loaded = ChimeConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[interpreter]\nmatching = \"word_boundary\"\n").unwrap();

        let loaded = ChimeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.interpreter.matching, MatchMode::WordBoundary);
        assert_eq!(loaded.scheduler, SchedulerConfig::default());
        assert_eq!(loaded.logging, LoggingConfig::default());
    }

    #[test]
    fn zero_tick_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\ntick_interval_ms = 0\n").unwrap();

        match ChimeConfig::from_file(&path) {
            Err(crate::error::ChimeError::Config(msg)) => {
                assert!(msg.contains("tick_interval_ms"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler\n").unwrap();
        assert!(matches!(
            ChimeConfig::from_file(&path),
            Err(crate::error::ChimeError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ChimeConfig::from_file(&dir.path().join("absent.toml")),
            Err(crate::error::ChimeError::Io(_))
        ));
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        let path = ChimeConfig::default_config_path();
        assert_eq!(path.file_name().unwrap(), "config.toml");
        assert!(path.to_string_lossy().contains("chime"));
    }
}
