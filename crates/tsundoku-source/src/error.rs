//! Source error types.

use thiserror::Error;

/// Errors reported by source plugins and plugin loaders.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The source requires a two-factor code that was not supplied.
    #[error("two-factor code required")]
    TwoFactorRequired,

    /// The supplied two-factor code was rejected.
    #[error("two-factor code rejected")]
    TwoFactorInvalid,

    /// The requested record does not exist upstream.
    #[error("not found upstream: {0}")]
    NotFound(String),

    /// Network, protocol or parse failure in the source.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// The artifact could not be turned into a plugin.
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    /// No factory is registered for the artifact kind.
    #[error("unknown plugin kind: {0}")]
    UnknownKind(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
