//! Configuration management for Tsundoku.
//!
//! This crate handles loading and validating the `tsundoku.toml` configuration file.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_FILE_NAME, default_config_path, load_config, load_or_default};
pub use schema::{Config, LogConfig, RegistryConfig, RegistryLocation, StorageConfig};
