//! Configuration schema.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Log levels accepted by `log.level`.
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Source registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Persistent storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry url is empty or the log level is unknown.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.registry.url.trim().is_empty() {
            return Err(ConfigError::Invalid("registry url is empty".to_string()));
        }

        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level: {} (expected one of {})",
                self.log.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Source registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry location: an `http(s)://` URL or a local directory.
    #[serde(default = "default_registry_url")]
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
        }
    }
}

fn default_registry_url() -> String {
    "https://sources.tsundoku.dev".to_string()
}

/// Where a registry lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLocation {
    /// Remote registry served over HTTP(S).
    Http(String),
    /// Registry directory on the local filesystem.
    Directory(PathBuf),
}

impl RegistryConfig {
    /// Classifies the configured url.
    #[must_use]
    pub fn location(&self) -> RegistryLocation {
        let url = self.url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            RegistryLocation::Http(url.to_string())
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            RegistryLocation::Directory(PathBuf::from(path))
        }
    }
}

/// Persistent storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Returns the configured data directory or the platform default
    /// (`<data dir>/tsundoku`), if one can be determined.
    #[must_use]
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("tsundoku")))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_empty_registry_url_invalid() {
        let mut config = Config::default();
        config.registry.url = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_log_level_invalid() {
        let mut config = Config::default();
        config.log.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown log level: loud"));
    }

    #[test]
    fn test_registry_location() {
        let http = RegistryConfig {
            url: "https://example.org/registry".to_string(),
        };
        assert_eq!(
            http.location(),
            RegistryLocation::Http("https://example.org/registry".to_string())
        );

        let file = RegistryConfig {
            url: "file:///srv/registry".to_string(),
        };
        assert_eq!(
            file.location(),
            RegistryLocation::Directory(PathBuf::from("/srv/registry"))
        );

        let dir = RegistryConfig {
            url: "./registry".to_string(),
        };
        assert_eq!(
            dir.location(),
            RegistryLocation::Directory(PathBuf::from("./registry"))
        );
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let storage = StorageConfig {
            data_dir: Some(PathBuf::from("/var/lib/tsundoku")),
        };
        assert_eq!(
            storage.resolve_data_dir(),
            Some(PathBuf::from("/var/lib/tsundoku"))
        );
    }

    #[test]
    fn test_default_config_serializes_and_reparses() {
        let toml = toml::to_string(&Config::default()).unwrap();
        assert!(toml.contains(r#"url = "https://sources.tsundoku.dev""#));
        assert!(toml.contains(r#"level = "warn""#));

        let reparsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(reparsed, Config::default());
    }
}
