//! Request and response shapes shared by every catalog source.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The catalog collections a source can page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Products,
    Variations,
    Categories,
    Posts,
}

impl Resource {
    /// Path segment used by the HTTP adapter and key used by snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Variations => "variations",
            Resource::Categories => "categories",
            Resource::Posts => "posts",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filters applied by the source. Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    /// Restrict to these record ids.
    pub ids: Vec<String>,
    /// Language/locale code, e.g. `"en"`.
    pub lang: Option<String>,
    /// Publication status, e.g. `"published"`.
    pub status: Option<String>,
    pub orderby: Option<String>,
    pub order: Option<SortOrder>,
    /// Only records whose `parent_id` equals this id (variation lookups).
    pub parent: Option<String>,
}

impl CatalogFilters {
    /// Copy of these filters narrowed to the children of `parent_id`.
    ///
    /// The id list is dropped: it selects parents, not their variations.
    #[must_use]
    pub fn for_parent(&self, parent_id: &str) -> Self {
        Self {
            ids: Vec::new(),
            parent: Some(parent_id.to_owned()),
            ..self.clone()
        }
    }
}

/// One page of records plus the total number of matching records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A page request as seen by a source; recorded by [`crate::MemorySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub resource: Resource,
    pub page: u32,
    pub per_page: u32,
    pub filters: CatalogFilters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_parent_keeps_lang_and_status_but_drops_ids() {
        let filters = CatalogFilters {
            ids: vec!["1".into(), "2".into()],
            lang: Some("en".into()),
            status: Some("published".into()),
            ..CatalogFilters::default()
        };
        let child = filters.for_parent("10");
        assert!(child.ids.is_empty());
        assert_eq!(child.lang.as_deref(), Some("en"));
        assert_eq!(child.status.as_deref(), Some("published"));
        assert_eq!(child.parent.as_deref(), Some("10"));
    }

    #[test]
    fn resource_names() {
        assert_eq!(Resource::Variations.to_string(), "variations");
        assert_eq!(Resource::Categories.as_str(), "categories");
    }
}
