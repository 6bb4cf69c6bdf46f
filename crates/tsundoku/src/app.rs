//! Wiring of configuration, logging and the source manager.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tsundoku_config::{
    Config, RegistryLocation, default_config_path, load_config as load_file, load_or_default,
};
use tsundoku_core::{FileStore, SourceManager};
use tsundoku_registry::{DirectoryRegistry, HttpRegistry, RegistryClient};
use tsundoku_source::BuiltinLoader;

use crate::cli::Cli;

/// Loads the configuration and applies command-line overrides.
///
/// An explicit `--config` file must exist; the default one is optional.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => load_or_default(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => Config::default(),
        },
    };

    if let Some(registry) = &cli.registry {
        config.registry.url.clone_from(registry);
    }
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = Some(data_dir.clone());
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects `debug` and the configured
/// level applies.
pub fn init_logging(config: &Config, verbose: bool) {
    let fallback = if verbose { "debug" } else { config.log.level.as_str() };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the source manager and restores its persisted state.
pub fn open_manager(config: &Config) -> Result<SourceManager> {
    let registry: Arc<dyn RegistryClient> = match config.registry.location() {
        RegistryLocation::Http(url) => {
            Arc::new(HttpRegistry::new(&url).context("failed to create registry client")?)
        }
        RegistryLocation::Directory(path) => Arc::new(DirectoryRegistry::new(path)),
    };

    let data_dir = config
        .storage
        .resolve_data_dir()
        .context("no data directory available; set storage.data_dir")?;
    let store = FileStore::new(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;

    let mut loader = BuiltinLoader::new();
    tsundoku_source_local::register(&mut loader);

    let manager = SourceManager::new(registry, Arc::new(loader), Arc::new(store));
    let restored = manager.restore().context("failed to restore saved state")?;
    debug!(sources = restored, data_dir = %data_dir.display(), "source manager ready");
    Ok(manager)
}
