//! Registry backed by a local directory.
//!
//! The directory has the same layout as an HTTP registry:
//! ```text
//! registry/
//! ├── index.json
//! └── sources/
//!     └── local-0.1.0.toml
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tsundoku_model::SourceDescriptor;
use tsundoku_source::PluginArtifact;

use crate::index::{IndexFile, artifact_path};
use crate::{INDEX_FILE_NAME, RegistryClient, RegistryError, RegistryResult};

/// Registry read from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    root: PathBuf,
}

impl DirectoryRegistry {
    /// Creates a registry rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the registry root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read(&self, path: PathBuf) -> RegistryResult<Vec<u8>> {
        tokio::fs::read(&path)
            .await
            .map_err(|source| RegistryError::Read { path, source })
    }

    async fn read_index(&self) -> RegistryResult<IndexFile> {
        let path = self.root.join(INDEX_FILE_NAME);
        tracing::debug!(path = %path.display(), "reading registry index");
        let location = path.display().to_string();
        let bytes = self.read(path).await?;
        IndexFile::parse(&bytes, &location)
    }
}

#[async_trait]
impl RegistryClient for DirectoryRegistry {
    async fn fetch_catalog(&self) -> RegistryResult<Vec<SourceDescriptor>> {
        Ok(self.read_index().await?.sources)
    }

    async fn fetch_artifact(&self, name: &str) -> RegistryResult<PluginArtifact> {
        let index = self.read_index().await?;
        let descriptor = index.find(name)?;

        let path = self.root.join(artifact_path(descriptor));
        tracing::info!(source = %name, path = %path.display(), "reading source artifact");
        let bytes = self.read(path).await?;

        Ok(PluginArtifact::new(
            &descriptor.name,
            descriptor.version.clone(),
            bytes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_registry() -> (TempDir, DirectoryRegistry) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(INDEX_FILE_NAME),
            r#"{
                "sources": [
                    {
                        "name": "local",
                        "display_name": "Local Library",
                        "version": "0.1.0",
                        "capabilities": ["search"]
                    },
                    {
                        "name": "broken",
                        "display_name": "Broken",
                        "version": "0.1.0"
                    }
                ]
            }"#,
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("sources")).unwrap();
        fs::write(
            temp_dir.path().join("sources/local-0.1.0.toml"),
            "kind = \"local\"\n",
        )
        .unwrap();

        let registry = DirectoryRegistry::new(temp_dir.path());
        (temp_dir, registry)
    }

    #[tokio::test]
    async fn test_fetch_catalog() {
        let (_temp, registry) = create_registry();
        let catalog = registry.fetch_catalog().await.unwrap();
        let names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["local", "broken"]);
    }

    #[tokio::test]
    async fn test_fetch_artifact() {
        let (_temp, registry) = create_registry();
        let artifact = registry.fetch_artifact("local").await.unwrap();
        assert_eq!(artifact.name, "local");
        assert_eq!(artifact.version, semver::Version::new(0, 1, 0));
        assert_eq!(artifact.manifest().unwrap().kind, "local");
    }

    #[tokio::test]
    async fn test_fetch_artifact_unknown_source() {
        let (_temp, registry) = create_registry();
        let err = registry.fetch_artifact("nope").await.unwrap_err();
        assert!(matches!(err, RegistryError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_artifact_missing_file() {
        let (_temp, registry) = create_registry();
        let err = registry.fetch_artifact("broken").await.unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }));
    }

    #[tokio::test]
    async fn test_missing_registry_is_unreachable() {
        let registry = DirectoryRegistry::new("/nonexistent/tsundoku-registry");
        let err = registry.fetch_catalog().await.unwrap_err();
        assert!(err.is_unreachable());
    }
}
