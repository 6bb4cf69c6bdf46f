//! Per-source authenticated sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsundoku_source::SessionToken;

use crate::sync::{read, write};

/// Store key of the persisted session of `source_name`.
pub(crate) fn session_key(source_name: &str) -> String {
    format!("sessions/{source_name}")
}

/// An authenticated session with one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Source the session belongs to.
    pub source_name: String,
    /// Opaque token issued by the source.
    pub token: String,
    /// Whether the session outlives the process.
    pub remember: bool,
    /// Expiry reported by the source.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Login time.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session from a token issued by `source_name`.
    #[must_use]
    pub fn new(source_name: impl Into<String>, token: SessionToken, remember: bool) -> Self {
        Self {
            source_name: source_name.into(),
            token: token.token,
            remember,
            expires_at: token.expires_at,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the session expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Returns the token to hand back to the source plugin.
    #[must_use]
    pub fn to_token(&self) -> SessionToken {
        SessionToken {
            token: self.token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Sessions keyed by source name. A later login overwrites the prior session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session, returning the one it replaced.
    pub fn set(&self, session: Session) -> Option<Session> {
        write(&self.sessions).insert(session.source_name.clone(), session)
    }

    /// Returns the live session of a source. Expired sessions are never returned.
    #[must_use]
    pub fn get(&self, source_name: &str) -> Option<Session> {
        read(&self.sessions)
            .get(source_name)
            .filter(|s| !s.is_expired_at(Utc::now()))
            .cloned()
    }

    /// Removes the session of a source.
    pub fn remove(&self, source_name: &str) -> Option<Session> {
        write(&self.sessions).remove(source_name)
    }

    /// Returns the names of sources with a stored session, sorted.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        let mut names: Vec<_> = read(&self.sessions).keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(value: &str, expires_at: Option<DateTime<Utc>>) -> SessionToken {
        SessionToken {
            token: value.to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_session_key() {
        assert_eq!(session_key("mangadex"), "sessions/mangadex");
    }

    #[test]
    fn test_later_login_overwrites() {
        let store = SessionStore::new();
        assert!(store.set(Session::new("foo", token("first", None), false)).is_none());

        let previous = store.set(Session::new("foo", token("second", None), true));
        assert_eq!(previous.unwrap().token, "first");

        let session = store.get("foo").unwrap();
        assert_eq!(session.token, "second");
        assert!(session.remember);
        assert_eq!(store.source_names(), vec!["foo"]);
    }

    #[test]
    fn test_expired_session_hidden() {
        let store = SessionStore::new();
        let past = Utc::now() - Duration::hours(1);
        store.set(Session::new("foo", token("old", Some(past)), true));

        assert!(store.get("foo").is_none());
    }

    #[test]
    fn test_future_expiry_visible() {
        let store = SessionStore::new();
        let future = Utc::now() + Duration::hours(1);
        store.set(Session::new("foo", token("fresh", Some(future)), false));

        let session = store.get("foo").unwrap();
        assert_eq!(session.to_token(), token("fresh", Some(future)));
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        store.set(Session::new("foo", token("t", None), false));
        assert!(store.remove("foo").is_some());
        assert!(store.get("foo").is_none());
        assert!(store.remove("foo").is_none());
    }

    #[test]
    fn test_session_json_reparses() {
        let session = Session::new("foo", token("t", None), true);
        let json = serde_json::to_vec(&session).unwrap();
        let reparsed: Session = serde_json::from_slice(&json).unwrap();
        assert_eq!(reparsed, session);
    }
}
