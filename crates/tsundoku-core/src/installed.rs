//! Records of installed sources.
//!
//! The records are stored as TOML under the `sources` key; artifact bytes are
//! stored next to them under `artifacts/<name>` so sources can be re-loaded
//! without the registry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsundoku_model::SourceDescriptor;

use crate::StoreResult;
use crate::store::{KeyValueStore, StoreError};

/// Store key of the installed-source records.
pub(crate) const SOURCES_KEY: &str = "sources";

/// Store key of the artifact of `source_name`.
pub(crate) fn artifact_key(source_name: &str) -> String {
    format!("artifacts/{source_name}")
}

/// Information about an installed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRecord {
    /// Catalog entry the source was installed from.
    pub descriptor: SourceDescriptor,
    /// Installation timestamp.
    pub installed_at: DateTime<Utc>,
}

impl InstalledRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self {
            descriptor,
            installed_at: Utc::now(),
        }
    }
}

/// The `sources` file format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct InstalledFile {
    #[serde(default)]
    sources: BTreeMap<String, InstalledRecord>,
}

/// Loads the installed-source records, keyed by source name.
pub(crate) fn load_records(
    store: &dyn KeyValueStore,
) -> StoreResult<BTreeMap<String, InstalledRecord>> {
    let Some(bytes) = store.get(SOURCES_KEY)? else {
        return Ok(BTreeMap::new());
    };

    let corrupt = |reason: String| StoreError::Corrupt {
        key: SOURCES_KEY.to_string(),
        reason,
    };
    let content = std::str::from_utf8(&bytes).map_err(|e| corrupt(e.to_string()))?;
    let file: InstalledFile = toml::from_str(content).map_err(|e| corrupt(e.to_string()))?;
    Ok(file.sources)
}

/// Replaces the installed-source records.
pub(crate) fn save_records(
    store: &dyn KeyValueStore,
    records: &BTreeMap<String, InstalledRecord>,
) -> StoreResult<()> {
    let file = InstalledFile {
        sources: records.clone(),
    };
    let content = toml::to_string_pretty(&file).map_err(|e| StoreError::Encode {
        key: SOURCES_KEY.to_string(),
        reason: e.to_string(),
    })?;
    store.put(SOURCES_KEY, content.as_bytes())
}
