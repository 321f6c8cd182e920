//! URL construction for catalog page requests.

use crate::error::SourceError;
use crate::types::{CatalogFilters, Resource};

/// Parses and checks the configured catalog base URL.
pub(super) fn parse_base_url(base_url: &str) -> Result<reqwest::Url, SourceError> {
    let url = reqwest::Url::parse(base_url).map_err(|e| SourceError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(SourceError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: "URL cannot carry path segments".to_owned(),
        });
    }

    Ok(url)
}

/// Builds `{base}/{resource}?page=..&per_page=..` plus one query pair per set filter.
pub(super) fn page_url(
    base: &reqwest::Url,
    resource: Resource,
    page: u32,
    per_page: u32,
    filters: &CatalogFilters,
) -> Result<String, SourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| SourceError::InvalidBaseUrl {
            base_url: base.to_string(),
            reason: "URL cannot carry path segments".to_owned(),
        })?
        .pop_if_empty()
        .push(resource.as_str());

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        if !filters.ids.is_empty() {
            query.append_pair("include", &filters.ids.join(","));
        }
        if let Some(lang) = &filters.lang {
            query.append_pair("lang", lang);
        }
        if let Some(status) = &filters.status {
            query.append_pair("status", status);
        }
        if let Some(orderby) = &filters.orderby {
            query.append_pair("orderby", orderby);
        }
        if let Some(order) = filters.order {
            query.append_pair("order", order.as_str());
        }
        if let Some(parent) = &filters.parent {
            query.append_pair("parent", parent);
        }
    }

    Ok(url.to_string())
}
