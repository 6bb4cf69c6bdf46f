//! Source plugin traits.

pub mod latest;
pub mod login;
pub mod search;

use async_trait::async_trait;
use tsundoku_model::{Capability, CapabilitySet};

use crate::{LatestUpdates, Login, NativeChapter, NativeManga, Search, SourceResult};

/// Reading order of the chapters a source returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChapterOrder {
    /// Sort by ascending chapter number.
    #[default]
    Ascending,
    /// Sort by descending chapter number.
    Descending,
    /// Keep the order the source returned.
    Provider,
}

/// Base trait for all source plugins.
///
/// Every source can fetch details and chapters of a manga it knows. Optional
/// capabilities are exposed through the `as_*` accessors; a plugin returns
/// `Some(self)` from the accessors of the capabilities it implements.
#[async_trait]
pub trait SourcePlugin: Send + Sync {
    /// Returns the source name.
    fn name(&self) -> &str;

    /// Returns the plugin version.
    fn version(&self) -> &str;

    /// Returns the order of the chapters returned by [`Self::fetch_chapters`].
    fn chapter_order(&self) -> ChapterOrder {
        ChapterOrder::Ascending
    }

    /// Returns the search capability, if supported.
    fn as_search(&self) -> Option<&dyn Search> {
        None
    }

    /// Returns the latest-updates capability, if supported.
    fn as_latest_updates(&self) -> Option<&dyn LatestUpdates> {
        None
    }

    /// Returns the login capability, if supported.
    fn as_login(&self) -> Option<&dyn Login> {
        None
    }

    /// Derives the capability set from the `as_*` accessors.
    fn capabilities(&self) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        if self.as_search().is_some() {
            set.insert(Capability::Search);
        }
        if self.as_latest_updates().is_some() {
            set.insert(Capability::LatestUpdates);
        }
        if self.as_login().is_some() {
            set.insert(Capability::Login);
        }
        set
    }

    /// Fetches fresh details of a manga.
    ///
    /// # Errors
    ///
    /// Returns an error if the manga cannot be fetched or parsed.
    async fn fetch_details(&self, native_id: &str) -> SourceResult<NativeManga>;

    /// Fetches the chapter list of a manga.
    ///
    /// # Errors
    ///
    /// Returns an error if the chapters cannot be fetched or parsed.
    async fn fetch_chapters(&self, native_id: &str) -> SourceResult<Vec<NativeChapter>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchFilter;

    struct MinimalSource;

    #[async_trait]
    impl SourcePlugin for MinimalSource {
        fn name(&self) -> &str {
            "minimal"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        async fn fetch_details(&self, native_id: &str) -> SourceResult<NativeManga> {
            Ok(NativeManga::new(native_id, "Minimal"))
        }

        async fn fetch_chapters(&self, _native_id: &str) -> SourceResult<Vec<NativeChapter>> {
            Ok(vec![])
        }
    }

    struct SearchableSource;

    #[async_trait]
    impl SourcePlugin for SearchableSource {
        fn name(&self) -> &str {
            "searchable"
        }

        fn version(&self) -> &str {
            "2.0.0"
        }

        fn as_search(&self) -> Option<&dyn Search> {
            Some(self)
        }

        async fn fetch_details(&self, native_id: &str) -> SourceResult<NativeManga> {
            Ok(NativeManga::new(native_id, "Searchable"))
        }

        async fn fetch_chapters(&self, _native_id: &str) -> SourceResult<Vec<NativeChapter>> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl Search for SearchableSource {
        async fn search(&self, filter: &SearchFilter) -> SourceResult<Vec<NativeManga>> {
            let query = filter.get("q").cloned().unwrap_or_default();
            Ok(vec![NativeManga::new("abc123", query)])
        }
    }

    #[test]
    fn test_default_capabilities_empty() {
        assert!(MinimalSource.capabilities().is_empty());
        assert_eq!(MinimalSource.chapter_order(), ChapterOrder::Ascending);
    }

    #[test]
    fn test_capabilities_derived_from_accessors() {
        let caps = SearchableSource.capabilities();
        assert!(caps.contains(Capability::Search));
        assert!(!caps.contains(Capability::Login));
        assert!(!caps.contains(Capability::LatestUpdates));
    }

    #[tokio::test]
    async fn test_dispatch_through_accessor() {
        let source: Box<dyn SourcePlugin> = Box::new(SearchableSource);
        let filter = SearchFilter::from([("q".to_string(), "dragon".to_string())]);

        let results = source
            .as_search()
            .unwrap()
            .search(&filter)
            .await
            .unwrap();
        assert_eq!(results[0].title, "dragon");
    }
}
