//! Provider-native records exchanged with plugins.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tsundoku_model::MangaMetadata;

/// Provider-defined search options, passed through to the plugin unvalidated.
pub type SearchFilter = BTreeMap<String, String>;

/// A manga as returned by a source, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeManga {
    /// Identifier of the manga in the source.
    pub native_id: String,
    /// Title.
    pub title: String,
    /// Descriptive metadata.
    pub metadata: MangaMetadata,
}

impl NativeManga {
    /// Creates a record with empty metadata.
    #[must_use]
    pub fn new(native_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            native_id: native_id.into(),
            title: title.into(),
            metadata: MangaMetadata::default(),
        }
    }
}

/// A chapter as returned by a source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeChapter {
    /// Identifier of the chapter in the source.
    pub native_id: String,
    /// Chapter number.
    pub number: Option<f64>,
    /// Volume label.
    pub volume: Option<String>,
    /// Chapter title.
    pub title: Option<String>,
    /// Release time.
    pub released_at: Option<DateTime<Utc>>,
}

impl NativeChapter {
    /// Creates a record with only an identifier and a number.
    #[must_use]
    pub fn new(native_id: impl Into<String>, number: Option<f64>) -> Self {
        Self {
            native_id: native_id.into(),
            number,
            volume: None,
            title: None,
            released_at: None,
        }
    }
}

/// Credentials handed to [`crate::Login::login`].
#[derive(Clone)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Two-factor code, when the caller has one.
    pub two_factor: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("two_factor", &self.two_factor.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// An authenticated session issued by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Opaque token or cookie value.
    pub token: String,
    /// Expiry reported by the source.
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials {
            username: "reader".to_string(),
            password: "hunter2".to_string(),
            two_factor: Some("123456".to_string()),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("reader"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("123456"));
    }
}
