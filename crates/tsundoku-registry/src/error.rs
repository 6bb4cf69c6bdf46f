//! Error types for registry clients.

use std::path::PathBuf;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry client error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// The HTTP request failed.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a non-success status.
    #[error("registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Failed to read a file of a directory registry.
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog could not be parsed.
    #[error("invalid registry index at {location}")]
    InvalidIndex {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// The source is not listed in the catalog.
    #[error("source not found in registry: {name}")]
    SourceNotFound { name: String },
}

impl RegistryError {
    /// Returns true if the registry itself could not be reached or read,
    /// as opposed to answering with unusable content.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::ClientBuild(_) | Self::Request { .. } | Self::Status { .. } | Self::Read { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = RegistryError::Status {
            url: "https://example.org/index.json".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "registry returned HTTP 503 for https://example.org/index.json"
        );
        assert!(err.is_unreachable());
    }

    #[test]
    fn test_not_found_is_reachable() {
        let err = RegistryError::SourceNotFound {
            name: "foo".to_string(),
        };
        assert_eq!(err.to_string(), "source not found in registry: foo");
        assert!(!err.is_unreachable());
    }
}
