//! Registry client interface.

use async_trait::async_trait;
use tsundoku_model::SourceDescriptor;
use tsundoku_source::PluginArtifact;

use crate::RegistryResult;

/// A catalog of installable sources.
///
/// Implementations never retry; transient failures are surfaced to the caller.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetches the full catalog of installable sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached or its index is invalid.
    async fn fetch_catalog(&self) -> RegistryResult<Vec<SourceDescriptor>>;

    /// Retrieves the plugin artifact of a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not listed or its artifact cannot be retrieved.
    async fn fetch_artifact(&self, name: &str) -> RegistryResult<PluginArtifact>;
}
