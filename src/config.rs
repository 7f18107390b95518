//! Configuration file handling for mongoclock.
//!
//! Loads configuration from `$MONGOCLOCK_CONFIG`, or from
//! `~/.config/mongoclock/config.toml` when that variable is unset.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "MONGOCLOCK_CONFIG";

/// Configuration file structure for mongoclock.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    /// Start in epoch-counter mode (the `-s` flag always wins).
    #[serde(default)]
    pub epoch: bool,
    /// Probe for the leap-second aware time source.
    #[serde(default = "default_true")]
    pub leap_seconds: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            epoch: false,
            leap_seconds: true,
        }
    }
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Write logs here instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })
        } else {
            log::debug!("no config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|d| d.join("mongoclock").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/mongoclock/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.clock.epoch);
        assert!(config.clock.leap_seconds);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_config("");
        assert_eq!(Config::load(Some(file.path())).unwrap(), Config::default());
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
[clock]
epoch = true
leap_seconds = false

[logging]
file = "/tmp/mongoclock.log"
"#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.clock.epoch);
        assert!(!config.clock.leap_seconds);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/mongoclock.log")));
    }

    #[test]
    fn test_partial_clock_section_keeps_leap_default() {
        let file = write_config("[clock]\nepoch = true\n");
        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.clock.epoch);
        assert!(config.clock.leap_seconds);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = write_config("[clock\nepoch = ");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let file = write_config("[clock]\ncolor = \"red\"\n");
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        if std::env::var_os(CONFIG_ENV).is_none() {
            assert!(default_path().ends_with("mongoclock/config.toml"));
        }
    }
}
