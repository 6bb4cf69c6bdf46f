//! Source descriptors.

use serde::{Deserialize, Serialize};

use crate::CapabilitySet;

/// A catalog entry as published by a source registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique, stable source name.
    pub name: String,

    /// Human readable name.
    pub display_name: String,

    /// Published version.
    pub version: semver::Version,

    /// Capabilities the source declares.
    #[serde(default)]
    pub capabilities: CapabilitySet,

    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Artifact location relative to the registry root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

/// A source as seen by callers: a catalog entry plus its install state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique, stable source name.
    pub name: String,

    /// Human readable name.
    pub display_name: String,

    /// Catalog (or installed) version.
    pub version: semver::Version,

    /// Capabilities the source declares.
    pub capabilities: CapabilitySet,

    /// Short description.
    pub description: Option<String>,

    /// Whether the source is installed in this manager.
    pub installed: bool,

    /// Installed version, if installed.
    pub installed_version: Option<semver::Version>,

    /// Whether the catalog has a newer version than the installed one.
    pub update_available: bool,
}

impl Source {
    /// Builds a not-installed source from a catalog entry.
    #[must_use]
    pub fn from_catalog(descriptor: &SourceDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            display_name: descriptor.display_name.clone(),
            version: descriptor.version.clone(),
            capabilities: descriptor.capabilities.clone(),
            description: descriptor.description.clone(),
            installed: false,
            installed_version: None,
            update_available: false,
        }
    }

    /// Builds an installed source from the descriptor it was installed from.
    #[must_use]
    pub fn installed(descriptor: &SourceDescriptor) -> Self {
        Self {
            installed: true,
            installed_version: Some(descriptor.version.clone()),
            ..Self::from_catalog(descriptor)
        }
    }

    /// Marks a catalog entry with the installed version, if any.
    #[must_use]
    pub fn with_installed_version(mut self, installed: Option<&semver::Version>) -> Self {
        self.installed = installed.is_some();
        self.update_available = installed.is_some_and(|v| self.version > *v);
        self.installed_version = installed.cloned();
        self
    }
}
