//! Latest-updates capability.

use async_trait::async_trait;

use crate::{NativeManga, SourceResult};

/// Paged listing of recently updated manga.
#[async_trait]
pub trait LatestUpdates: Send + Sync {
    /// Lists recently updated manga. `page` starts at 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    async fn latest_updates(&self, page: u32) -> SourceResult<Vec<NativeManga>>;
}
