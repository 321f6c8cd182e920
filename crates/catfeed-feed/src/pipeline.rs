//! Per-request orchestration: fetch, project, expand, cascade, resolve,
//! serialize.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use catfeed_core::{AppConfig, CatalogItem, CategoryNode, FieldMapping, PriceDisplay};
use catfeed_source::{fetch_all, CatalogFilters, CatalogSource, Page, Resource};
use serde::Deserialize;

use crate::categories::annotate_categories;
use crate::context::RequestContext;
use crate::error::{FeedError, MissingReference};
use crate::projector::{FeedItem, FieldSelection, Projector};
use crate::serialize::{serialize, ChannelMeta, Format};
use crate::variants::{cascade, VariantExpander};

/// Largest page a client may request.
pub const MAX_LIMIT: u32 = 500;

/// Immutable pipeline settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub mapping: FieldMapping,
    pub page_size: u32,
    pub variant_page_size: u32,
    pub max_source_pages: usize,
    pub default_status: Option<String>,
    pub price_display: PriceDisplay,
    pub channel: ChannelMeta,
}

impl FeedConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, mapping: FieldMapping) -> Self {
        Self {
            mapping,
            page_size: config.page_size,
            variant_page_size: config.variant_page_size,
            max_source_pages: config.max_source_pages,
            default_status: Some(config.default_status.clone()).filter(|s| !s.is_empty()),
            price_display: config.price_display,
            channel: ChannelMeta {
                title: config.feed_title.clone(),
                link: config.store_url.clone(),
                description: format!("{} catalog export", config.feed_title),
            },
        }
    }
}

/// Which collection a feed exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Products,
    Posts,
}

impl FeedKind {
    #[must_use]
    pub fn resource(self) -> Resource {
        match self {
            FeedKind::Products => Resource::Products,
            FeedKind::Posts => Resource::Posts,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource().as_str())
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" => Ok(FeedKind::Products),
            "posts" => Ok(FeedKind::Posts),
            other => Err(format!("unknown feed '{other}' (expected products or posts)")),
        }
    }
}

/// One page request against a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub kind: FeedKind,
    pub format: Format,
    pub offset: u64,
    /// `None` uses the configured page size.
    pub limit: Option<u32>,
    pub fields: FieldSelection,
    pub lang: Option<String>,
    pub ids: Vec<String>,
}

impl FeedRequest {
    /// First page of `kind` as XML, all fields, default page size.
    #[must_use]
    pub fn new(kind: FeedKind) -> Self {
        Self {
            kind,
            format: Format::Xml,
            offset: 0,
            limit: None,
            fields: FieldSelection::all(),
            lang: None,
            ids: Vec::new(),
        }
    }
}

/// A rendered page plus the facts a caller needs to fetch the next one.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub body: String,
    pub content_type: &'static str,
    pub is_first: bool,
    pub is_last: bool,
    /// Total matching top-level records reported by the source.
    pub total: u64,
    /// Effective page size after clamping.
    pub limit: u32,
    /// Top-level rows rendered on this page.
    pub rows: usize,
    pub missing_references: Vec<MissingReference>,
}

/// Clamps a requested limit to `1..=MAX_LIMIT`, defaulting to `page_size`.
#[must_use]
pub fn clamp_limit(requested: Option<u32>, page_size: u32) -> u32 {
    requested.unwrap_or(page_size).clamp(1, MAX_LIMIT)
}

/// Maps an offset/limit window onto 1-based source pages of size `limit`.
///
/// An aligned offset is exactly one page. An unaligned one spans two pages;
/// the first `skip` records of the first page are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub first_page: u32,
    pub per_page: u32,
    pub skip: usize,
}

impl PageWindow {
    #[must_use]
    pub fn new(offset: u64, limit: u32) -> Self {
        let limit = limit.max(1);
        let page_index = offset / u64::from(limit);
        #[allow(clippy::cast_possible_truncation)]
        let skip = (offset % u64::from(limit)) as usize;
        Self {
            first_page: u32::try_from(page_index)
                .unwrap_or(u32::MAX - 1)
                .saturating_add(1),
            per_page: limit,
            skip,
        }
    }

    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.skip == 0
    }
}

/// Runs feed requests against a catalog source.
pub struct FeedPipeline<S> {
    source: Arc<S>,
    config: Arc<FeedConfig>,
}

impl<S> Clone for FeedPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: CatalogSource> FeedPipeline<S> {
    #[must_use]
    pub fn new(source: Arc<S>, config: Arc<FeedConfig>) -> Self {
        Self { source, config }
    }

    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Builds one page of the feed.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Source`] if any source call fails (no partial
    /// output), or a render error if serialization fails. Unresolvable
    /// references never fail the request; they are reported on the document.
    pub async fn run(&self, request: &FeedRequest) -> Result<FeedDocument, FeedError> {
        let limit = clamp_limit(request.limit, self.config.page_size);
        let window = PageWindow::new(request.offset, limit);
        let filters = self.filters(request);

        let (items, total) = self
            .fetch_window(request.kind.resource(), window, &filters)
            .await?;
        let is_first = request.offset == 0;
        let is_last = request.offset.saturating_add(u64::from(limit)) >= total;

        let mut ctx = RequestContext::new();
        let projector = Projector::new(&self.config.mapping, self.config.price_display);

        let rows = match request.kind {
            FeedKind::Posts => items
                .iter()
                .map(|item| projector.project(item, &request.fields))
                .collect(),
            FeedKind::Products => {
                let expander = VariantExpander::new(
                    self.source.as_ref(),
                    projector,
                    self.config.variant_page_size,
                    self.config.max_source_pages,
                );
                let expanded = expander.expand(&items, &request.fields, &filters).await?;
                let mut rows = cascade(expanded, &mut ctx);

                if request.fields.includes("categories") && any_category_ids(&rows) {
                    self.load_categories(&mut ctx, &filters).await?;
                    annotate_categories(&mut rows, &mut ctx);
                }
                rows
            }
        };

        let body = serialize(
            &rows,
            is_first,
            is_last,
            request.format,
            &self.config.channel,
        )?;

        tracing::info!(
            feed = %request.kind,
            format = %request.format,
            offset = request.offset,
            limit,
            total,
            rows = rows.len(),
            missing_references = ctx.missing_references().len(),
            category_walks = ctx.traversals(),
            "built feed page"
        );

        Ok(FeedDocument {
            body,
            content_type: request.format.content_type(),
            is_first,
            is_last,
            total,
            limit,
            rows: rows.len(),
            missing_references: ctx.missing_references().to_vec(),
        })
    }

    fn filters(&self, request: &FeedRequest) -> CatalogFilters {
        CatalogFilters {
            ids: request.ids.clone(),
            lang: request.lang.clone(),
            status: self.config.default_status.clone(),
            ..CatalogFilters::default()
        }
    }

    async fn fetch_window(
        &self,
        resource: Resource,
        window: PageWindow,
        filters: &CatalogFilters,
    ) -> Result<(Vec<CatalogItem>, u64), FeedError> {
        let first: Page<CatalogItem> = self
            .source
            .fetch_page(resource, window.first_page, window.per_page, filters)
            .await?;
        let total = first.total;
        let mut records = first.records;

        if window.is_aligned() {
            return Ok((records, total));
        }

        if records.len() >= window.per_page as usize {
            let second: Page<CatalogItem> = self
                .source
                .fetch_page(
                    resource,
                    window.first_page.saturating_add(1),
                    window.per_page,
                    filters,
                )
                .await?;
            records.extend(second.records);
        }

        let records = records
            .into_iter()
            .skip(window.skip)
            .take(window.per_page as usize)
            .collect();
        Ok((records, total))
    }

    async fn load_categories(
        &self,
        ctx: &mut RequestContext,
        filters: &CatalogFilters,
    ) -> Result<(), FeedError> {
        let category_filters = CatalogFilters {
            lang: filters.lang.clone(),
            ..CatalogFilters::default()
        };
        let nodes: Vec<CategoryNode> = fetch_all(
            self.source.as_ref(),
            Resource::Categories,
            self.config.page_size.clamp(1, MAX_LIMIT),
            self.config.max_source_pages,
            &category_filters,
        )
        .await?;
        tracing::debug!(categories = nodes.len(), "loaded category nodes");
        ctx.load_categories(nodes);
        Ok(())
    }
}

fn any_category_ids(rows: &[FeedItem]) -> bool {
    rows.iter()
        .any(|r| !r.category_ids.is_empty() || any_category_ids(&r.variants))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None, 100), 100);
        assert_eq!(clamp_limit(Some(0), 100), 1);
        assert_eq!(clamp_limit(Some(10_000), 100), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(25), 100), 25);
    }

    #[test]
    fn aligned_offset_is_one_page() {
        let window = PageWindow::new(20, 10);
        assert_eq!(window.first_page, 3);
        assert!(window.is_aligned());
    }

    #[test]
    fn unaligned_offset_spans_two_pages() {
        let window = PageWindow::new(15, 10);
        assert_eq!(window.first_page, 2);
        assert_eq!(window.skip, 5);
        assert!(!window.is_aligned());
    }

    #[test]
    fn huge_offset_saturates_page_number() {
        let window = PageWindow::new(u64::MAX, 1);
        assert_eq!(window.first_page, u32::MAX);
    }

    #[test]
    fn feed_kind_parses() {
        assert_eq!("Products".parse::<FeedKind>().unwrap(), FeedKind::Products);
        assert_eq!(FeedKind::Posts.to_string(), "posts");
        assert!("pages".parse::<FeedKind>().is_err());
    }
}
