//! Data model for Tsundoku.
//!
//! This crate provides the normalized types exchanged between the source
//! manager, registry clients and callers:
//! - [`Source`] and [`SourceDescriptor`]: installable and installed sources
//! - [`Capability`] and [`CapabilitySet`]: optional operations a source supports
//! - [`Manga`] and [`Chapter`]: normalized entities carrying internal surrogate IDs
//! - [`ChapterUpdate`]: an entry of the favorites updates feed

mod capability;
mod manga;
mod source;

pub use capability::{Capability, CapabilitySet};
pub use manga::{Chapter, ChapterId, ChapterUpdate, Manga, MangaId, MangaMetadata};
pub use source::{Source, SourceDescriptor};
