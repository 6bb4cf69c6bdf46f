//! Favorite manga.

use std::collections::BTreeSet;
use std::sync::RwLock;

use tsundoku_model::MangaId;

use crate::StoreResult;
use crate::store::{KeyValueStore, load_json, save_json};
use crate::sync::{read, write};

/// Store key of the favorite set.
pub(crate) const FAVORITES_KEY: &str = "favorites";

/// The set of favorite manga IDs, persisted as a JSON array.
///
/// Mutations persist before they become visible; when persisting fails the
/// in-memory set is left unchanged.
#[derive(Debug, Default)]
pub struct FavoritesStore {
    ids: RwLock<BTreeSet<MangaId>>,
}

impl FavoritesStore {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the persisted set, replacing the current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted set cannot be read or decoded.
    pub fn restore(&self, store: &dyn KeyValueStore) -> StoreResult<usize> {
        let ids: BTreeSet<MangaId> = load_json(store, FAVORITES_KEY)?.unwrap_or_default();
        let count = ids.len();
        *write(&self.ids) = ids;
        Ok(count)
    }

    /// Adds a manga. Returns false if it was already a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated set cannot be persisted.
    pub fn insert(&self, store: &dyn KeyValueStore, id: MangaId) -> StoreResult<bool> {
        let mut ids = write(&self.ids);
        if ids.contains(&id) {
            return Ok(false);
        }

        let mut updated = ids.clone();
        updated.insert(id);
        save_json(store, FAVORITES_KEY, &updated)?;
        *ids = updated;
        Ok(true)
    }

    /// Removes a manga. Returns false if it was not a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated set cannot be persisted.
    pub fn remove(&self, store: &dyn KeyValueStore, id: MangaId) -> StoreResult<bool> {
        let mut ids = write(&self.ids);
        if !ids.contains(&id) {
            return Ok(false);
        }

        let mut updated = ids.clone();
        updated.remove(&id);
        save_json(store, FAVORITES_KEY, &updated)?;
        *ids = updated;
        Ok(true)
    }

    /// Returns true if the manga is a favorite.
    #[must_use]
    pub fn contains(&self, id: MangaId) -> bool {
        read(&self.ids).contains(&id)
    }

    /// Returns the favorite IDs in ascending order.
    #[must_use]
    pub fn list(&self) -> Vec<MangaId> {
        read(&self.ids).iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError};

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn put(&self, key: &str, _value: &[u8]) -> StoreResult<()> {
            Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::other("read-only"),
            })
        }

        fn delete(&self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_insert_is_idempotent() {
        let store = MemoryStore::new();
        let favorites = FavoritesStore::new();

        assert!(favorites.insert(&store, 3).unwrap());
        assert!(!favorites.insert(&store, 3).unwrap());
        assert_eq!(favorites.list(), vec![3]);
    }

    #[test]
    fn test_save_then_delete_restores_prior_set() {
        let store = MemoryStore::new();
        let favorites = FavoritesStore::new();
        favorites.insert(&store, 1).unwrap();
        let before = favorites.list();

        favorites.insert(&store, 2).unwrap();
        favorites.remove(&store, 2).unwrap();
        assert_eq!(favorites.list(), before);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let store = MemoryStore::new();
        let favorites = FavoritesStore::new();
        assert!(!favorites.remove(&store, 7).unwrap());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_persists_and_restores() {
        let store = MemoryStore::new();
        let favorites = FavoritesStore::new();
        favorites.insert(&store, 5).unwrap();
        favorites.insert(&store, 2).unwrap();
        assert_eq!(store.get(FAVORITES_KEY).unwrap(), Some(b"[2,5]".to_vec()));

        let restored = FavoritesStore::new();
        assert_eq!(restored.restore(&store).unwrap(), 2);
        assert!(restored.contains(5));
        assert_eq!(restored.list(), vec![2, 5]);
    }

    #[test]
    fn test_failed_persist_leaves_set_unchanged() {
        let favorites = FavoritesStore::new();
        assert!(favorites.insert(&ReadOnlyStore, 1).is_err());
        assert!(!favorites.contains(1));
        assert!(favorites.list().is_empty());
    }
}
