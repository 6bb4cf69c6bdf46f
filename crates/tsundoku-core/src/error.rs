//! Manager error types.

use thiserror::Error;
use tsundoku_model::{Capability, ChapterId, MangaId};
use tsundoku_registry::RegistryError;
use tsundoku_source::SourceError;

use crate::StoreError;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors returned by [`crate::SourceManager`] operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The source is not listed in the registry catalog.
    #[error("source not found in registry: {name}")]
    SourceNotFound { name: String },

    /// No manga has this internal ID.
    #[error("manga not found: {id}")]
    MangaNotFound { id: MangaId },

    /// No chapter has this internal ID.
    #[error("chapter not found: {id}")]
    ChapterNotFound { id: ChapterId },

    /// The source is not installed.
    #[error("source not installed: {name}")]
    NotInstalled { name: String },

    /// The source does not declare the capability.
    #[error("source {name} does not support {capability}")]
    UnsupportedCapability { name: String, capability: Capability },

    /// An argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The source rejected the credentials.
    #[error("authentication failed for {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    /// The source requires a two-factor code that was not supplied.
    #[error("source {name} requires a two-factor code")]
    TwoFactorRequired { name: String },

    /// The source rejected the two-factor code.
    #[error("two-factor code rejected by {name}")]
    TwoFactorInvalid { name: String },

    /// Installing the source failed; nothing was registered.
    #[error("failed to install source {name}")]
    InstallFailed {
        name: String,
        #[source]
        cause: InstallError,
    },

    /// The registry could not be reached or returned an unusable catalog.
    #[error("source registry unavailable")]
    RemoteUnavailable(#[source] RegistryError),

    /// The source plugin failed.
    #[error("source {name} failed")]
    Upstream {
        name: String,
        #[source]
        cause: SourceError,
    },

    /// Persisting state failed.
    #[error("storage error")]
    Storage(#[from] StoreError),
}

/// Why an install failed.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The artifact could not be retrieved.
    #[error("artifact retrieval failed")]
    Retrieval(#[source] RegistryError),

    /// The artifact could not be loaded.
    #[error("artifact could not be loaded")]
    Load(#[source] SourceError),

    /// The loaded plugin does not match its catalog entry.
    #[error("{0}")]
    Validation(String),

    /// The installed source could not be persisted.
    #[error("installed source could not be persisted")]
    Storage(#[source] StoreError),
}

/// Distinguishable failure kinds, for callers that branch on errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotInstalled,
    UnsupportedCapability,
    InvalidArgument,
    AuthFailed,
    TwoFactorRequired,
    TwoFactorInvalid,
    InstallFailed,
    RemoteUnavailable,
    UpstreamError,
    Storage,
}

impl ManagerError {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound { .. } | Self::MangaNotFound { .. } | Self::ChapterNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::NotInstalled { .. } => ErrorKind::NotInstalled,
            Self::UnsupportedCapability { .. } => ErrorKind::UnsupportedCapability,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AuthFailed { .. } => ErrorKind::AuthFailed,
            Self::TwoFactorRequired { .. } => ErrorKind::TwoFactorRequired,
            Self::TwoFactorInvalid { .. } => ErrorKind::TwoFactorInvalid,
            Self::InstallFailed { .. } => ErrorKind::InstallFailed,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Wraps a plugin error raised by source `name`.
    pub(crate) fn upstream(name: &str, cause: SourceError) -> Self {
        Self::Upstream {
            name: name.to_string(),
            cause,
        }
    }

    pub(crate) fn unsupported(name: &str, capability: Capability) -> Self {
        Self::UnsupportedCapability {
            name: name.to_string(),
            capability,
        }
    }

    pub(crate) fn install_failed(name: &str, cause: InstallError) -> Self {
        Self::InstallFailed {
            name: name.to_string(),
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(
            ManagerError::MangaNotFound { id: 999 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ManagerError::SourceNotFound {
                name: "foo".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_unsupported_display() {
        let err = ManagerError::unsupported("foo", Capability::Login);
        assert_eq!(err.to_string(), "source foo does not support login");
        assert_eq!(err.kind(), ErrorKind::UnsupportedCapability);
    }

    #[test]
    fn test_upstream_keeps_cause() {
        let err = ManagerError::upstream("foo", SourceError::Upstream("timeout".to_string()));
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("upstream failure: timeout".to_string())
        );
    }

    #[test]
    fn test_install_failed_chain() {
        let err = ManagerError::install_failed(
            "foo",
            InstallError::Validation("missing capability: login".to_string()),
        );
        assert_eq!(err.to_string(), "failed to install source foo");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("missing capability: login".to_string())
        );
    }
}
