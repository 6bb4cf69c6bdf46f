//! Reading `tsundoku.toml`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult, RegistryLocation};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "tsundoku.toml";

/// Reads and validates a configuration file.
///
/// Relative `storage.data_dir` and registry directory paths are resolved
/// against the directory holding the file.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if the file does not exist, or an error
/// if it cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(base) = path.parent() {
        resolve_relative_paths(&mut config, base);
    }
    config.validate()?;

    debug!(path = %path.display(), registry = %config.registry.url, "loaded configuration");
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or validated.
pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Config> {
    match load_config(path) {
        Err(ConfigError::NotFound(path)) => {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Config::default())
        }
        other => other,
    }
}

/// Returns `<config dir>/tsundoku/tsundoku.toml`, if the platform has a
/// configuration directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tsundoku").join(CONFIG_FILE_NAME))
}

fn resolve_relative_paths(config: &mut Config, base: &Path) {
    if let Some(data_dir) = &config.storage.data_dir
        && data_dir.is_relative()
    {
        config.storage.data_dir = Some(base.join(data_dir));
    }

    if let RegistryLocation::Directory(dir) = config.registry.location()
        && dir.is_relative()
        && !dir.as_os_str().is_empty()
    {
        config.registry.url = base.join(dir).display().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, contents).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/tsundoku/tsundoku.toml");
        assert!(matches!(
            load_config(path),
            Err(ConfigError::NotFound(p)) if p == path
        ));
        assert_eq!(load_or_default(path).unwrap(), Config::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        let (_temp, path) = write_config("");
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_custom_values() {
        let (_temp, path) = write_config(
            r#"
            [registry]
            url = "https://sources.example.org"

            [storage]
            data_dir = "/var/lib/tsundoku"

            [log]
            level = "debug"
        "#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.registry.url, "https://sources.example.org");
        assert_eq!(
            config.storage.data_dir,
            Some(PathBuf::from("/var/lib/tsundoku"))
        );
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_relative_paths_follow_the_file() {
        let (temp, path) = write_config(
            r#"
            [registry]
            url = "registry"

            [storage]
            data_dir = "data"
        "#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.storage.data_dir, Some(temp.path().join("data")));
        assert_eq!(
            config.registry.location(),
            RegistryLocation::Directory(temp.path().join("registry"))
        );
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let (_temp, path) = write_config("this is not valid toml [[[");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
        assert!(load_or_default(&path).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let (_temp, path) = write_config("[log]\nlevel = \"chatty\"\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));
    }
}
