//! Source plugin interface for Tsundoku.
//!
//! This crate provides the capability traits every source plugin implements
//! and the infrastructure to turn installable artifacts into live plugins:
//! - [`SourcePlugin`]: Base trait for all sources (details and chapters)
//! - [`Search`], [`LatestUpdates`], [`Login`]: Optional capabilities
//! - [`PluginArtifact`] and [`PluginLoader`]: Installable artifacts and their loaders

mod artifact;
mod error;
mod loader;
mod record;
mod traits;

pub use artifact::{ArtifactManifest, PluginArtifact};
pub use error::{SourceError, SourceResult};
pub use loader::{BuiltinLoader, PluginFactory, PluginLoader};
pub use record::{Credentials, NativeChapter, NativeManga, SearchFilter, SessionToken};
pub use traits::latest::LatestUpdates;
pub use traits::login::Login;
pub use traits::search::Search;
pub use traits::{ChapterOrder, SourcePlugin};
