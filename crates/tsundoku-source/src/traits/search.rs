//! Search capability.

use async_trait::async_trait;

use crate::{NativeManga, SearchFilter, SourceResult};

/// Free-form search over a source.
#[async_trait]
pub trait Search: Send + Sync {
    /// Searches the source.
    ///
    /// The filter keys are provider-defined; unknown keys should be ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    async fn search(&self, filter: &SearchFilter) -> SourceResult<Vec<NativeManga>>;
}
