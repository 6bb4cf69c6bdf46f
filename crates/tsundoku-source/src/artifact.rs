//! Installable plugin artifacts.

use serde::{Deserialize, Serialize};

use crate::{SourceError, SourceResult};

/// An installable plugin artifact as retrieved from a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginArtifact {
    /// Source name the artifact is published under.
    pub name: String,
    /// Artifact version.
    pub version: semver::Version,
    /// Raw artifact contents.
    pub bytes: Vec<u8>,
}

impl PluginArtifact {
    /// Creates a new artifact.
    #[must_use]
    pub fn new(name: impl Into<String>, version: semver::Version, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            version,
            bytes,
        }
    }

    /// Parses the artifact contents as a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidArtifact`] if the contents are not a
    /// UTF-8 TOML manifest.
    pub fn manifest(&self) -> SourceResult<ArtifactManifest> {
        let text = std::str::from_utf8(&self.bytes).map_err(|e| {
            SourceError::InvalidArtifact(format!("{}: not valid UTF-8: {e}", self.name))
        })?;
        toml::from_str(text)
            .map_err(|e| SourceError::InvalidArtifact(format!("{}: {e}", self.name)))
    }
}

/// Manifest describing a bundled plugin.
///
/// ```toml
/// kind = "local"
///
/// [options]
/// root = "/srv/manga"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Plugin kind, matched against the loader's registered factories.
    pub kind: String,

    /// Kind-specific options.
    #[serde(default)]
    pub options: toml::Table,
}

impl ArtifactManifest {
    /// Returns a string option.
    #[must_use]
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(toml::Value::as_str)
    }

    /// Returns an integer option.
    #[must_use]
    pub fn option_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(toml::Value::as_integer)
    }

    /// Serializes the manifest to artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidArtifact`] if the options cannot be serialized.
    pub fn to_bytes(&self) -> SourceResult<Vec<u8>> {
        toml::to_string(self)
            .map(String::into_bytes)
            .map_err(|e| SourceError::InvalidArtifact(e.to_string()))
    }
}
