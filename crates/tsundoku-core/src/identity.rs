//! Stable internal identities for provider-native records.
//!
//! The store maps `(source name, native id)` pairs to manga IDs and
//! `(manga ID, native id)` pairs to chapter IDs, caching the latest normalized
//! entity for each. A chapter never moves to another manga. The mapping is append-only: IDs start
//! at 1, increase monotonically and are never reused, even after the owning
//! source is uninstalled.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsundoku_model::{Chapter, ChapterId, Manga, MangaId, MangaMetadata};
use tsundoku_source::{NativeChapter, NativeManga};

use crate::StoreResult;
use crate::store::StoreError;
use crate::sync::lock;

/// `(source name, native id)` of a manga.
type MangaKey = (String, String);
/// Chapter native ids are only unique within their manga.
type ChapterKey = (MangaId, String);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MangaEntry {
    source_name: String,
    native_id: String,
    title: String,
    #[serde(default)]
    metadata: MangaMetadata,
    /// Chapter IDs in reading order, once a chapter list has been fetched.
    #[serde(default)]
    chapters: Option<Vec<ChapterId>>,
}

impl MangaEntry {
    fn to_manga(&self, id: MangaId) -> Manga {
        Manga {
            id,
            source_name: self.source_name.clone(),
            source_native_id: self.native_id.clone(),
            title: self.title.clone(),
            metadata: self.metadata.clone(),
            chapters: None,
            is_favorite: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChapterEntry {
    manga_id: MangaId,
    native_id: String,
    number: Option<f64>,
    volume: Option<String>,
    title: Option<String>,
    released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    last_manga_id: MangaId,
    last_chapter_id: ChapterId,
    manga: BTreeMap<MangaId, MangaEntry>,
    chapters: BTreeMap<ChapterId, ChapterEntry>,

    #[serde(skip)]
    manga_index: HashMap<MangaKey, MangaId>,
    #[serde(skip)]
    chapter_index: HashMap<ChapterKey, ChapterId>,
    /// Bumped on every change, to tell which snapshot is the latest.
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    persisted_generation: u64,
}

impl State {
    fn rebuild_indices(&mut self) {
        self.manga_index = self
            .manga
            .iter()
            .map(|(id, e)| ((e.source_name.clone(), e.native_id.clone()), *id))
            .collect();
        self.chapter_index = self
            .chapters
            .iter()
            .map(|(id, e)| ((e.manga_id, e.native_id.clone()), *id))
            .collect();
    }

    fn upsert_manga(&mut self, source_name: &str, native: NativeManga) -> Manga {
        let key = (source_name.to_string(), native.native_id.clone());
        self.generation += 1;

        if let Some(&id) = self.manga_index.get(&key)
            && let Some(entry) = self.manga.get_mut(&id)
        {
            entry.title = native.title;
            entry.metadata = native.metadata;
            return entry.to_manga(id);
        }

        self.last_manga_id += 1;
        let id = self.last_manga_id;
        let entry = MangaEntry {
            source_name: key.0.clone(),
            native_id: key.1.clone(),
            title: native.title,
            metadata: native.metadata,
            chapters: None,
        };
        let manga = entry.to_manga(id);
        self.manga.insert(id, entry);
        self.manga_index.insert(key, id);
        tracing::debug!(source = source_name, manga_id = id, "allocated manga identity");
        manga
    }

    fn upsert_chapter(&mut self, manga_id: MangaId, native: NativeChapter) -> ChapterId {
        let key = (manga_id, native.native_id.clone());

        if let Some(&id) = self.chapter_index.get(&key) {
            if let Some(entry) = self.chapters.get_mut(&id) {
                entry.number = native.number;
                entry.volume = native.volume;
            }
            return id;
        }

        self.last_chapter_id += 1;
        let id = self.last_chapter_id;
        self.chapters.insert(
            id,
            ChapterEntry {
                manga_id,
                native_id: key.1.clone(),
                number: native.number,
                volume: native.volume,
                title: native.title,
                released_at: native.released_at,
            },
        );
        self.chapter_index.insert(key, id);
        id
    }

    fn chapter(&self, id: ChapterId) -> Option<Chapter> {
        self.chapters.get(&id).map(|e| Chapter {
            id,
            manga_id: e.manga_id,
            source_native_id: e.native_id.clone(),
            number: e.number,
            volume: e.volume.clone(),
            title: e.title.clone(),
            released_at: e.released_at,
        })
    }

    fn manga(&self, id: MangaId) -> Option<Manga> {
        self.manga.get(&id).map(|e| e.to_manga(id))
    }
}

/// Bidirectional `(source name, native id) ↔ ID` mapping for manga and
/// chapters, with a cache of the latest normalized entities.
///
/// Every operation runs in one critical section, so concurrent normalization
/// of the same record never allocates twice.
#[derive(Debug, Default)]
pub struct IdentityStore {
    state: Mutex<State>,
}

impl IdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes one manga from `source_name`, allocating an ID on first
    /// sight and refreshing the cached fields otherwise.
    pub fn normalize_manga(&self, source_name: &str, native: NativeManga) -> Manga {
        lock(&self.state).upsert_manga(source_name, native)
    }

    /// Normalizes a batch of manga, keeping their order.
    pub fn normalize_manga_list(&self, source_name: &str, natives: Vec<NativeManga>) -> Vec<Manga> {
        let mut state = lock(&self.state);
        natives
            .into_iter()
            .map(|native| state.upsert_manga(source_name, native))
            .collect()
    }

    /// Refreshes the cached fields of a known manga.
    ///
    /// Returns `None` if `id` is unknown. The native id of `native` is ignored;
    /// the stored mapping is authoritative.
    pub fn refresh_manga(&self, id: MangaId, native: NativeManga) -> Option<Manga> {
        let mut state = lock(&self.state);
        let entry = state.manga.get_mut(&id)?;
        entry.title = native.title;
        entry.metadata = native.metadata;
        state.generation += 1;
        state.manga(id)
    }

    /// Normalizes the chapter list of a manga, in the given order, and caches
    /// that order as the manga's chapter list.
    ///
    /// Returns `None` if `manga_id` is unknown.
    pub fn normalize_chapters(
        &self,
        manga_id: MangaId,
        natives: Vec<NativeChapter>,
    ) -> Option<Vec<Chapter>> {
        let mut state = lock(&self.state);
        if !state.manga.contains_key(&manga_id) {
            return None;
        }

        let ids: Vec<ChapterId> = natives
            .into_iter()
            .map(|native| state.upsert_chapter(manga_id, native))
            .collect();
        let chapters: Vec<Chapter> = ids.iter().filter_map(|id| state.chapter(*id)).collect();

        if let Some(entry) = state.manga.get_mut(&manga_id) {
            entry.chapters = Some(ids);
        }
        state.generation += 1;
        Some(chapters)
    }

    /// Returns the cached manga.
    #[must_use]
    pub fn manga(&self, id: MangaId) -> Option<Manga> {
        lock(&self.state).manga(id)
    }

    /// Returns the cached chapter.
    #[must_use]
    pub fn chapter(&self, id: ChapterId) -> Option<Chapter> {
        lock(&self.state).chapter(id)
    }

    /// Returns the cached chapter list of a manga, if one was fetched.
    #[must_use]
    pub fn cached_chapters(&self, manga_id: MangaId) -> Option<Vec<Chapter>> {
        let state = lock(&self.state);
        let ids = state.manga.get(&manga_id)?.chapters.as_ref()?;
        Some(ids.iter().filter_map(|id| state.chapter(*id)).collect())
    }

    /// Returns the owning source name and native id of a manga.
    #[must_use]
    pub fn owner(&self, id: MangaId) -> Option<(String, String)> {
        lock(&self.state)
            .manga
            .get(&id)
            .map(|e| (e.source_name.clone(), e.native_id.clone()))
    }

    /// Returns the ID allocated to `(source_name, native_id)`, if any.
    #[must_use]
    pub fn lookup(&self, source_name: &str, native_id: &str) -> Option<MangaId> {
        lock(&self.state)
            .manga_index
            .get(&(source_name.to_string(), native_id.to_string()))
            .copied()
    }

    /// Returns true if `id` is a known manga.
    #[must_use]
    pub fn contains_manga(&self, id: MangaId) -> bool {
        lock(&self.state).manga.contains_key(&id)
    }

    /// Returns the number of known manga.
    #[must_use]
    pub fn manga_count(&self) -> usize {
        lock(&self.state).manga.len()
    }

    /// Returns true if the store changed since the last persisted snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        let state = lock(&self.state);
        state.generation != state.persisted_generation
    }

    /// Serializes the store, returning the bytes and the generation they
    /// capture. Pass the generation to [`Self::mark_persisted`] once written.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded.
    pub fn snapshot(&self) -> StoreResult<(Vec<u8>, u64)> {
        let state = lock(&self.state);
        let bytes = serde_json::to_vec(&*state).map_err(|e| StoreError::Encode {
            key: "identities".to_string(),
            reason: e.to_string(),
        })?;
        Ok((bytes, state.generation))
    }

    /// Records that the snapshot of `generation` was persisted.
    pub fn mark_persisted(&self, generation: u64) {
        let mut state = lock(&self.state);
        if generation > state.persisted_generation {
            state.persisted_generation = generation;
        }
    }

    /// Replaces the store contents with a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be decoded.
    pub fn restore(&self, bytes: &[u8]) -> StoreResult<()> {
        let mut restored: State = serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
            key: "identities".to_string(),
            reason: e.to_string(),
        })?;
        restored.rebuild_indices();

        // Never hand out an ID below one already present in the snapshot.
        restored.last_manga_id = restored
            .manga
            .last_key_value()
            .map_or(restored.last_manga_id, |(id, _)| (*id).max(restored.last_manga_id));
        restored.last_chapter_id = restored
            .chapters
            .last_key_value()
            .map_or(restored.last_chapter_id, |(id, _)| {
                (*id).max(restored.last_chapter_id)
            });

        tracing::debug!(
            manga = restored.manga.len(),
            chapters = restored.chapters.len(),
            "restored identities"
        );
        *lock(&self.state) = restored;
        Ok(())
    }
}
