//! In-memory catalog source backed by a JSON snapshot.
//!
//! Snapshot layout:
//!
//! ```json
//! {
//!   "products":   [{"id": "1", "kind": "parent", ...}],
//!   "variations": [{"id": "11", "kind": "variant", "parent_id": "1", ...}],
//!   "categories": [{"id": "5", "name": "Shoes", "parent_id": null}],
//!   "posts":      [{"id": "p1", "title": "Spring sale"}]
//! }
//! ```
//!
//! Filters follow the HTTP adapter's semantics: `ids` matches `id`, `parent`
//! matches `parent_id`, and `lang`/`status` match same-named record keys when
//! a record carries them (records without the key match any value).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::source::{check_page_bounds, CatalogSource};
use crate::types::{CatalogFilters, Page, PageRequest, Resource, SortOrder};

#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    products: Vec<Value>,
    #[serde(default)]
    variations: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    posts: Vec<Value>,
}

/// Serves catalog pages from memory and records every page request.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: HashMap<Resource, Vec<Value>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the records served for `resource`.
    #[must_use]
    pub fn with_records(mut self, resource: Resource, records: Vec<Value>) -> Self {
        self.records.insert(resource, records);
        self
    }

    /// Builds a source from a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Deserialize`] if the value is not a snapshot object.
    pub fn from_snapshot_value(value: &Value) -> Result<Self, SourceError> {
        let snapshot =
            Snapshot::deserialize(value).map_err(|e| SourceError::Deserialize {
                context: "catalog snapshot".to_owned(),
                source: e,
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Reads a snapshot file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Deserialize`] if the file is not a valid
    /// snapshot. I/O errors are reported through the same variant with the
    /// path in the context.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::Deserialize {
            context: format!("catalog snapshot {}", path.display()),
            source: serde_json::Error::io(e),
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| SourceError::Deserialize {
                context: format!("catalog snapshot {}", path.display()),
                source: e,
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self::new()
            .with_records(Resource::Products, snapshot.products)
            .with_records(Resource::Variations, snapshot.variations)
            .with_records(Resource::Categories, snapshot.categories)
            .with_records(Resource::Posts, snapshot.posts)
    }

    /// Every page request served so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn record_request(&self, request: PageRequest) {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
    }

    fn select(&self, resource: Resource, filters: &CatalogFilters) -> Vec<&Value> {
        let mut matched: Vec<&Value> = self
            .records
            .get(&resource)
            .map(|records| records.iter().filter(|r| matches(r, filters)).collect())
            .unwrap_or_default();

        if let Some(key) = &filters.orderby {
            matched.sort_by(|a, b| compare_key(a.get(key), b.get(key)));
            if filters.order == Some(SortOrder::Desc) {
                matched.reverse();
            }
        }

        matched
    }
}

impl CatalogSource for MemorySource {
    async fn fetch_page<T>(
        &self,
        resource: Resource,
        page: u32,
        per_page: u32,
        filters: &CatalogFilters,
    ) -> Result<Page<T>, SourceError>
    where
        T: DeserializeOwned + Send,
    {
        check_page_bounds(page, per_page)?;
        self.record_request(PageRequest {
            resource,
            page,
            per_page,
            filters: filters.clone(),
        });

        let matched = self.select(resource, filters);
        let total = matched.len() as u64;
        let start = (page as usize - 1).saturating_mul(per_page as usize);

        let records = matched
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .map(|value| {
                T::deserialize(value).map_err(|e| SourceError::Deserialize {
                    context: format!("{resource} record from snapshot"),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { records, total })
    }
}

fn matches(record: &Value, filters: &CatalogFilters) -> bool {
    if !filters.ids.is_empty() {
        let Some(id) = key_string(record.get("id")) else {
            return false;
        };
        if !filters.ids.iter().any(|wanted| *wanted == id) {
            return false;
        }
    }

    if let Some(parent) = &filters.parent {
        if key_string(record.get("parent_id")).as_deref() != Some(parent.as_str()) {
            return false;
        }
    }

    optional_key_matches(record, "lang", filters.lang.as_deref())
        && optional_key_matches(record, "status", filters.status.as_deref())
}

fn optional_key_matches(record: &Value, key: &str, wanted: Option<&str>) -> bool {
    match (wanted, key_string(record.get(key))) {
        (Some(wanted), Some(actual)) => actual == wanted,
        _ => true,
    }
}

fn key_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compare_key(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (a, b) => key_string(a).cmp(&key_string(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot() -> MemorySource {
        MemorySource::from_snapshot_value(&json!({
            "products": [
                {"id": 3, "title": "Gamma", "status": "published", "lang": "en"},
                {"id": 1, "title": "Alpha", "status": "published", "lang": "fr"},
                {"id": 2, "title": "Beta", "status": "draft"}
            ],
            "variations": [
                {"id": "11", "parent_id": "1"},
                {"id": "21", "parent_id": 2}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn pages_and_reports_total() {
        let source = snapshot();
        let page: Page<Value> = source
            .fetch_page(Resource::Products, 2, 2, &CatalogFilters::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn empty_match_is_an_empty_page() {
        let source = snapshot();
        let filters = CatalogFilters {
            ids: vec!["404".into()],
            ..CatalogFilters::default()
        };
        let page: Page<Value> = source
            .fetch_page(Resource::Products, 1, 10, &filters)
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn filters_by_status_and_lang() {
        let source = snapshot();
        let filters = CatalogFilters {
            status: Some("published".into()),
            lang: Some("en".into()),
            ..CatalogFilters::default()
        };
        let page: Page<Value> = source
            .fetch_page(Resource::Products, 1, 10, &filters)
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0]["title"], "Gamma");
    }

    #[tokio::test]
    async fn filters_by_parent_with_numeric_ids() {
        let source = snapshot();
        let filters = CatalogFilters::default().for_parent("2");
        let page: Page<Value> = source
            .fetch_page(Resource::Variations, 1, 10, &filters)
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0]["id"], "21");
    }

    #[tokio::test]
    async fn orders_by_key() {
        let source = snapshot();
        let filters = CatalogFilters {
            orderby: Some("id".into()),
            order: Some(SortOrder::Desc),
            ..CatalogFilters::default()
        };
        let page: Page<Value> = source
            .fetch_page(Resource::Products, 1, 10, &filters)
            .await
            .unwrap();
        let ids: Vec<i64> = page
            .records
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn rejects_zero_page() {
        let source = snapshot();
        let result: Result<Page<Value>, _> = source
            .fetch_page(Resource::Products, 0, 10, &CatalogFilters::default())
            .await;
        assert!(matches!(
            result,
            Err(SourceError::InvalidPage {
                page: 0,
                per_page: 10
            })
        ));
    }

    #[tokio::test]
    async fn records_requests() {
        let source = snapshot();
        let _: Page<Value> = source
            .fetch_page(Resource::Posts, 1, 5, &CatalogFilters::default())
            .await
            .unwrap();
        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].resource, Resource::Posts);
        assert_eq!(requests[0].per_page, 5);
    }
}
