//! Registry index format.
//!
//! ```json
//! {
//!   "sources": [
//!     {
//!       "name": "local",
//!       "display_name": "Local Library",
//!       "version": "0.1.0",
//!       "capabilities": ["search", "latest-updates"],
//!       "artifact": "sources/local-0.1.0.toml"
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tsundoku_model::SourceDescriptor;

use crate::{RegistryError, RegistryResult};

/// Name of the catalog file at the registry root.
pub const INDEX_FILE_NAME: &str = "index.json";

/// The registry index file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IndexFile {
    /// Published sources.
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

impl IndexFile {
    /// Parses an index, naming `location` in errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid index.
    pub fn parse(content: &[u8], location: &str) -> RegistryResult<Self> {
        serde_json::from_slice(content).map_err(|source| RegistryError::InvalidIndex {
            location: location.to_string(),
            source,
        })
    }

    /// Finds a source by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SourceNotFound`] if the source is not listed.
    pub fn find(&self, name: &str) -> RegistryResult<&SourceDescriptor> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| RegistryError::SourceNotFound {
                name: name.to_string(),
            })
    }
}

/// Returns the artifact path of a source relative to the registry root.
///
/// Defaults to `sources/<name>-<version>.toml` when the entry names none.
#[must_use]
pub fn artifact_path(descriptor: &SourceDescriptor) -> String {
    descriptor
        .artifact
        .clone()
        .unwrap_or_else(|| format!("sources/{}-{}.toml", descriptor.name, descriptor.version))
}
