use std::future::Future;

use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::types::{CatalogFilters, Page, Resource};

/// Read-only access to a paginated upstream catalog.
///
/// Implementations must return an empty page (not an error) when the filters
/// match nothing, and reject `page == 0` or `per_page == 0` with
/// [`SourceError::InvalidPage`].
pub trait CatalogSource: Send + Sync {
    /// Fetches page `page` (1-based) of `resource`, `per_page` records at a time.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the upstream cannot be queried or returns
    /// records that do not deserialize into `T`.
    fn fetch_page<T>(
        &self,
        resource: Resource,
        page: u32,
        per_page: u32,
        filters: &CatalogFilters,
    ) -> impl Future<Output = Result<Page<T>, SourceError>> + Send
    where
        T: DeserializeOwned + Send;
}

pub(crate) fn check_page_bounds(page: u32, per_page: u32) -> Result<(), SourceError> {
    if page == 0 || per_page == 0 {
        return Err(SourceError::InvalidPage { page, per_page });
    }
    Ok(())
}
