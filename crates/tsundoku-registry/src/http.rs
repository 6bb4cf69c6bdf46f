//! HTTP(S) source registry.

use async_trait::async_trait;
use tsundoku_model::SourceDescriptor;
use tsundoku_source::PluginArtifact;

use crate::index::{IndexFile, artifact_path};
use crate::{INDEX_FILE_NAME, RegistryClient, RegistryError, RegistryResult};

/// Registry served over HTTP(S).
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistry {
    /// Creates a registry client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(RegistryError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Downloads a URL, mapping transport and status failures.
    async fn get_bytes(&self, url: &str) -> RegistryResult<Vec<u8>> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| RegistryError::Request {
                    url: url.to_string(),
                    source,
                })?;

        if !response.status().is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| RegistryError::Request {
                url: url.to_string(),
                source,
            })?;

        Ok(bytes.to_vec())
    }

    async fn fetch_index(&self) -> RegistryResult<IndexFile> {
        let url = join_url(&self.base_url, INDEX_FILE_NAME);
        tracing::debug!(%url, "fetching registry index");
        let bytes = self.get_bytes(&url).await?;
        IndexFile::parse(&bytes, &url)
    }
}

#[async_trait]
impl RegistryClient for HttpRegistry {
    async fn fetch_catalog(&self) -> RegistryResult<Vec<SourceDescriptor>> {
        Ok(self.fetch_index().await?.sources)
    }

    async fn fetch_artifact(&self, name: &str) -> RegistryResult<PluginArtifact> {
        let index = self.fetch_index().await?;
        let descriptor = index.find(name)?;

        let url = join_url(&self.base_url, &artifact_path(descriptor));
        tracing::info!(source = %name, %url, "downloading source artifact");
        let bytes = self.get_bytes(&url).await?;

        Ok(PluginArtifact::new(
            &descriptor.name,
            descriptor.version.clone(),
            bytes,
        ))
    }
}

/// Joins a registry-relative path onto a base URL.
///
/// Absolute `http(s)://` paths are returned unchanged.
fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://example.org/registry", "index.json"),
            "https://example.org/registry/index.json"
        );
        assert_eq!(
            join_url("https://example.org/registry/", "/sources/foo-1.0.0.toml"),
            "https://example.org/registry/sources/foo-1.0.0.toml"
        );
    }

    #[test]
    fn test_join_absolute_artifact_url() {
        assert_eq!(
            join_url("https://example.org", "https://cdn.example.org/foo.toml"),
            "https://cdn.example.org/foo.toml"
        );
    }

    #[test]
    fn test_new_keeps_base_url() {
        let registry = HttpRegistry::new("https://example.org/registry").unwrap();
        assert_eq!(registry.base_url(), "https://example.org/registry");
    }

    #[tokio::test]
    async fn test_unreachable_registry() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let registry = HttpRegistry::new("http://127.0.0.1:9").unwrap();
        let err = registry.fetch_catalog().await.unwrap_err();
        assert!(err.is_unreachable());
    }
}
