//! Multi-page fetch loop shared by every caller that needs a whole collection.
//!
//! Termination rule: the loop stops as soon as a page comes back with fewer
//! than `per_page` records, including an empty first page. An upstream that
//! keeps returning full pages is cut off by `max_pages`.

use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::source::CatalogSource;
use crate::types::{CatalogFilters, Resource};

/// Fetches every record of `resource` matching `filters`.
///
/// **All-or-nothing semantics**: on any page failure, records from earlier
/// pages are discarded and the error is returned.
///
/// # Errors
///
/// Propagates any error from [`CatalogSource::fetch_page`].
/// Returns [`SourceError::PaginationLimit`] if more than `max_pages` full pages
/// are returned.
pub async fn fetch_all<S, T>(
    source: &S,
    resource: Resource,
    per_page: u32,
    max_pages: usize,
    filters: &CatalogFilters,
) -> Result<Vec<T>, SourceError>
where
    S: CatalogSource,
    T: DeserializeOwned + Send,
{
    let mut all_records: Vec<T> = Vec::new();
    let mut page_count = 0usize;
    let mut page = 1u32;

    loop {
        page_count += 1;
        if page_count > max_pages {
            return Err(SourceError::PaginationLimit {
                resource: resource.to_string(),
                max_pages,
            });
        }

        let fetched = source
            .fetch_page::<T>(resource, page, per_page, filters)
            .await?;
        let returned = fetched.records.len();
        all_records.extend(fetched.records);

        if returned < per_page as usize {
            break;
        }
        page += 1;
    }

    tracing::debug!(
        %resource,
        pages = page_count,
        records = all_records.len(),
        "fetched all catalog pages"
    );

    Ok(all_records)
}
