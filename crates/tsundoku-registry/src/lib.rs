//! Source registry clients for Tsundoku.
//!
//! A registry publishes an `index.json` catalog of installable sources next to
//! their plugin artifacts. This crate handles:
//! - Fetching the catalog from an HTTP(S) registry ([`HttpRegistry`])
//! - Reading the catalog from a local directory ([`DirectoryRegistry`])
//! - Retrieving plugin artifacts by source name

pub mod client;
pub mod directory;
pub mod error;
pub mod http;
pub mod index;

pub use client::RegistryClient;
pub use directory::DirectoryRegistry;
pub use error::{RegistryError, RegistryResult};
pub use http::HttpRegistry;
pub use index::{INDEX_FILE_NAME, IndexFile};
