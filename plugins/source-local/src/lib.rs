//! Local library source plugin.
//!
//! Serves manga from a directory tree:
//! ```text
//! <root>/
//! ├── Dragon Quest/
//! │   ├── info.toml
//! │   ├── Vol.1 Ch.1.cbz
//! │   └── Vol.1 Ch.2.cbz
//! └── Tiger/
//!     └── chapter-1/
//! ```
//! Every subdirectory of the root is a manga; every entry inside it, file or
//! directory, is a chapter. The optional `info.toml` overrides the title and
//! provides metadata.

mod parse;

use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use tsundoku_model::MangaMetadata;
use tsundoku_source::{
    ArtifactManifest, BuiltinLoader, LatestUpdates, NativeChapter, NativeManga, PluginArtifact,
    PluginFactory, Search, SearchFilter, SourceError, SourcePlugin, SourceResult,
};

pub use parse::{chapter_number, volume_label};

/// Manifest kind served by this plugin.
pub const KIND: &str = "local";

/// Name of the optional metadata file of a manga directory.
pub const INFO_FILE_NAME: &str = "info.toml";

/// Default number of manga per latest-updates page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Contents of `info.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MangaInfo {
    title: Option<String>,
    authors: Vec<String>,
    genres: Vec<String>,
    status: Option<String>,
    description: Option<String>,
    cover_url: Option<String>,
}

/// Source serving manga from a local directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    name: String,
    version: String,
    root: PathBuf,
    page_size: usize,
}

impl LocalSource {
    /// Creates a source named `name` serving the directory `root`.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            root: root.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the latest-updates page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the reported plugin version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Returns the library root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a manga directory, rejecting ids that leave the root.
    fn manga_dir(&self, native_id: &str) -> SourceResult<PathBuf> {
        if native_id.is_empty()
            || native_id.starts_with('.')
            || native_id.contains(['/', '\\'])
        {
            return Err(SourceError::NotFound(native_id.to_string()));
        }

        let dir = self.root.join(native_id);
        if !dir.is_dir() {
            return Err(SourceError::NotFound(native_id.to_string()));
        }
        Ok(dir)
    }

    /// Lists the manga directory names, sorted.
    async fn manga_ids(&self) -> SourceResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && entry.file_type().await?.is_dir() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read_manga(&self, native_id: &str) -> SourceResult<NativeManga> {
        let dir = self.manga_dir(native_id)?;
        let info = read_info(&dir).await?;

        Ok(NativeManga {
            native_id: native_id.to_string(),
            title: info.title.unwrap_or_else(|| native_id.to_string()),
            metadata: MangaMetadata {
                authors: info.authors,
                genres: info.genres,
                status: info.status,
                description: info.description,
                cover_url: info.cover_url,
            },
        })
    }

    /// Returns the most recent modification time of a manga directory and
    /// its entries.
    async fn last_modified(&self, native_id: &str) -> SourceResult<SystemTime> {
        let dir = self.manga_dir(native_id)?;
        let mut latest = tokio::fs::metadata(&dir).await?.modified()?;

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let modified = entry.metadata().await?.modified()?;
            latest = latest.max(modified);
        }
        Ok(latest)
    }
}

async fn read_info(dir: &Path) -> SourceResult<MangaInfo> {
    let path = dir.join(INFO_FILE_NAME);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(MangaInfo::default()),
        Err(e) => return Err(e.into()),
    };

    Ok(toml::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring invalid manga info");
        MangaInfo::default()
    }))
}

fn matches_filter(manga: &NativeManga, filter: &SearchFilter) -> bool {
    let query = filter.get("q").or_else(|| filter.get("title"));
    if let Some(query) = query {
        let query = query.to_lowercase();
        if !manga.title.to_lowercase().contains(&query)
            && !manga.native_id.to_lowercase().contains(&query)
        {
            return false;
        }
    }

    if let Some(genre) = filter.get("genre")
        && !manga
            .metadata
            .genres
            .iter()
            .any(|g| g.eq_ignore_ascii_case(genre))
    {
        return false;
    }

    true
}

#[async_trait]
impl SourcePlugin for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn as_search(&self) -> Option<&dyn Search> {
        Some(self)
    }

    fn as_latest_updates(&self) -> Option<&dyn LatestUpdates> {
        Some(self)
    }

    async fn fetch_details(&self, native_id: &str) -> SourceResult<NativeManga> {
        self.read_manga(native_id).await
    }

    async fn fetch_chapters(&self, native_id: &str) -> SourceResult<Vec<NativeChapter>> {
        let dir = self.manga_dir(native_id)?;
        let mut chapters = Vec::new();

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') || file_name == INFO_FILE_NAME {
                continue;
            }

            let metadata = entry.metadata().await?;
            let label = if metadata.is_dir() {
                file_name.clone()
            } else {
                Path::new(&file_name)
                    .file_stem()
                    .map_or_else(|| file_name.clone(), |s| s.to_string_lossy().into_owned())
            };

            chapters.push(NativeChapter {
                native_id: format!("{native_id}/{file_name}"),
                number: chapter_number(&label),
                volume: volume_label(&label),
                title: Some(label),
                released_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        chapters.sort_by(|a, b| a.native_id.cmp(&b.native_id));
        debug!(manga = native_id, chapters = chapters.len(), "listed local chapters");
        Ok(chapters)
    }
}

#[async_trait]
impl Search for LocalSource {
    async fn search(&self, filter: &SearchFilter) -> SourceResult<Vec<NativeManga>> {
        let mut results = Vec::new();
        for id in self.manga_ids().await? {
            let manga = self.read_manga(&id).await?;
            if matches_filter(&manga, filter) {
                results.push(manga);
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl LatestUpdates for LocalSource {
    async fn latest_updates(&self, page: u32) -> SourceResult<Vec<NativeManga>> {
        let mut dated = Vec::new();
        for id in self.manga_ids().await? {
            let modified = self.last_modified(&id).await?;
            dated.push((modified, id));
        }
        // Newest first; ties keep name order.
        dated.sort_by_key(|(modified, _)| Reverse(*modified));

        let skip = (page.max(1) as usize - 1).saturating_mul(self.page_size);
        let mut results = Vec::new();
        for (_, id) in dated.into_iter().skip(skip).take(self.page_size) {
            results.push(self.read_manga(&id).await?);
        }
        Ok(results)
    }
}

/// Returns the factory building [`LocalSource`]s from `local` artifacts.
///
/// Manifest options: `root` (required) and `page_size`.
#[must_use]
pub fn factory() -> PluginFactory {
    Box::new(
        |artifact: &PluginArtifact,
         manifest: &ArtifactManifest|
         -> SourceResult<Arc<dyn SourcePlugin>> {
            let root = manifest.option_str("root").ok_or_else(|| {
                SourceError::InvalidArtifact(format!("{}: missing option `root`", artifact.name))
            })?;

            let mut source = LocalSource::new(&artifact.name, root)
                .with_version(artifact.version.to_string());
            if let Some(page_size) = manifest.option_int("page_size") {
                let page_size = usize::try_from(page_size)
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or_else(|| {
                        SourceError::InvalidArtifact(format!(
                            "{}: page_size must be positive, got {page_size}",
                            artifact.name
                        ))
                    })?;
                source = source.with_page_size(page_size);
            }

            Ok(Arc::new(source))
        },
    )
}

/// Registers the [`KIND`] factory with a loader.
pub fn register(loader: &mut BuiltinLoader) {
    loader.register(KIND, factory());
}
