//! Turning artifacts into live plugins.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{ArtifactManifest, PluginArtifact, SourceError, SourcePlugin, SourceResult};

/// Loads plugin artifacts into live source plugins.
pub trait PluginLoader: Send + Sync {
    /// Loads an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact is malformed or cannot be instantiated.
    fn load(&self, artifact: &PluginArtifact) -> SourceResult<Arc<dyn SourcePlugin>>;
}

/// Factory building a plugin from an artifact and its parsed manifest.
pub type PluginFactory = Box<
    dyn Fn(&PluginArtifact, &ArtifactManifest) -> SourceResult<Arc<dyn SourcePlugin>>
        + Send
        + Sync,
>;

/// Loader for plugins compiled into the binary.
///
/// Artifacts are TOML manifests; the manifest `kind` selects the factory.
#[derive(Default)]
pub struct BuiltinLoader {
    factories: HashMap<String, PluginFactory>,
}

impl BuiltinLoader {
    /// Creates a loader with no registered factories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for a kind, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Registers a factory and returns the loader.
    #[must_use]
    pub fn with_factory(mut self, kind: impl Into<String>, factory: PluginFactory) -> Self {
        self.register(kind, factory);
        self
    }

    /// Returns the registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<_> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl PluginLoader for BuiltinLoader {
    fn load(&self, artifact: &PluginArtifact) -> SourceResult<Arc<dyn SourcePlugin>> {
        let manifest = artifact.manifest()?;
        debug!(name = %artifact.name, kind = %manifest.kind, "loading builtin plugin");

        let factory = self
            .factories
            .get(&manifest.kind)
            .ok_or_else(|| SourceError::UnknownKind(manifest.kind.clone()))?;

        factory(artifact, &manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NativeChapter, NativeManga};
    use async_trait::async_trait;

    struct NamedSource {
        name: String,
    }

    #[async_trait]
    impl SourcePlugin for NamedSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        async fn fetch_details(&self, native_id: &str) -> SourceResult<NativeManga> {
            Ok(NativeManga::new(native_id, native_id))
        }

        async fn fetch_chapters(&self, _native_id: &str) -> SourceResult<Vec<NativeChapter>> {
            Ok(vec![])
        }
    }

    fn named_factory() -> PluginFactory {
        Box::new(
            |artifact: &PluginArtifact,
             _manifest: &ArtifactManifest|
             -> SourceResult<Arc<dyn SourcePlugin>> {
                Ok(Arc::new(NamedSource {
                    name: artifact.name.clone(),
                }))
            },
        )
    }

    fn artifact(contents: &str) -> PluginArtifact {
        PluginArtifact::new("foo", semver::Version::new(0, 1, 0), contents.as_bytes().to_vec())
    }

    #[test]
    fn test_load_registered_kind() {
        let loader = BuiltinLoader::new().with_factory("named", named_factory());
        let plugin = loader.load(&artifact(r#"kind = "named""#)).unwrap();
        assert_eq!(plugin.name(), "foo");
    }

    #[test]
    fn test_unknown_kind() {
        let loader = BuiltinLoader::new().with_factory("named", named_factory());
        let result = loader.load(&artifact(r#"kind = "wasm""#));
        assert!(matches!(result, Err(SourceError::UnknownKind(kind)) if kind == "wasm"));
    }

    #[test]
    fn test_kinds_sorted() {
        let loader = BuiltinLoader::new()
            .with_factory("zeta", named_factory())
            .with_factory("alpha", named_factory());
        assert_eq!(loader.kinds(), vec!["alpha", "zeta"]);
    }
}
