//! Core library for Tsundoku.
//!
//! This crate provides the [`SourceManager`], which aggregates installed
//! source plugins behind one interface, and the stores it is built on:
//! - [`IdentityStore`]: stable internal IDs for provider-native manga and chapters
//! - [`SessionStore`]: per-source authenticated sessions
//! - [`FavoritesStore`]: the set of favorite manga
//! - [`KeyValueStore`]: the persistence boundary, with [`MemoryStore`] and [`FileStore`]

mod error;
mod favorites;
mod identity;
mod installed;
mod manager;
mod session;
mod store;
mod sync;

pub use error::{ErrorKind, InstallError, ManagerError, ManagerResult};
pub use favorites::FavoritesStore;
pub use identity::IdentityStore;
pub use installed::InstalledRecord;
pub use manager::SourceManager;
pub use session::{Session, SessionStore};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult};
