//! Login capability.

use async_trait::async_trait;

use crate::{Credentials, SessionToken, SourceResult};

/// Authenticated sessions.
///
/// A plugin keeps its own session state; the manager only records the issued
/// token and hands remembered tokens back on restart.
#[async_trait]
#[allow(unused_variables)]
pub trait Login: Send + Sync {
    /// Logs in with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SourceError::AuthFailed`] for rejected credentials,
    /// [`crate::SourceError::TwoFactorRequired`] when a code is needed but
    /// missing, and [`crate::SourceError::TwoFactorInvalid`] when the code is
    /// rejected.
    async fn login(&self, credentials: &Credentials) -> SourceResult<SessionToken>;

    /// Restores a previously issued session.
    fn restore_session(&self, token: &SessionToken) {}
}
