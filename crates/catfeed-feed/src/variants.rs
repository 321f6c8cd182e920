//! Variant expansion and price cascade.
//!
//! Expansion turns every parent item into the parent row followed by one row
//! per variation, fetched from the source. The cascade then folds variant rows
//! back under their parents and pulls the discounted variant's pricing up to
//! the parent.

use std::collections::HashMap;

use catfeed_core::{CatalogItem, FieldValue, ItemKind};
use catfeed_source::{fetch_all, CatalogFilters, CatalogSource, Resource};
use rust_decimal::Decimal;

use crate::context::RequestContext;
use crate::error::{FeedError, MissingReference};
use crate::projector::{FeedItem, FieldSelection, Projector};

/// Field a variant's own title is kept under when it differs from the parent's.
pub const VARIANT_TITLE_FIELD: &str = "variant_title";

/// Expands parent items into parent + variant rows.
pub struct VariantExpander<'a, S> {
    source: &'a S,
    projector: Projector<'a>,
    per_page: u32,
    max_pages: usize,
}

impl<'a, S: CatalogSource> VariantExpander<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, projector: Projector<'a>, per_page: u32, max_pages: usize) -> Self {
        Self {
            source,
            projector,
            per_page,
            max_pages,
        }
    }

    /// Projects `items` and expands every parent into its variants.
    ///
    /// Simple items pass through. Parents are emitted first, followed by their
    /// variants in source order. Variation lookups reuse `filters` (language and
    /// status) narrowed to the parent.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Source`] if a variation page cannot be fetched or
    /// a parent has more than `max_pages` full pages of variations.
    pub async fn expand(
        &self,
        items: &[CatalogItem],
        selection: &FieldSelection,
        filters: &CatalogFilters,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let mut rows = Vec::with_capacity(items.len());

        for item in items {
            let row = self.projector.project(item, selection);
            if item.kind != ItemKind::Parent {
                rows.push(row);
                continue;
            }

            let variations: Vec<CatalogItem> = fetch_all(
                self.source,
                Resource::Variations,
                self.per_page,
                self.max_pages,
                &filters.for_parent(&item.id),
            )
            .await?;

            tracing::debug!(
                parent_id = %item.id,
                variations = variations.len(),
                "expanded parent item"
            );

            let variant_rows: Vec<FeedItem> = variations
                .iter()
                .map(|v| merge_variant(&row, self.projector.project(v, selection)))
                .collect();
            rows.push(row);
            rows.extend(variant_rows);
        }

        Ok(rows)
    }
}

/// Lays a projected variation over a copy of its parent row.
///
/// Variant values win wherever they are set. The sale price is never
/// inherited: upstream sends no value for "not on sale", so a variant
/// without one is not discounted. The row takes the parent's display title;
/// a differing variant title moves to [`VARIANT_TITLE_FIELD`].
#[must_use]
pub fn merge_variant(parent: &FeedItem, variant: FeedItem) -> FeedItem {
    let mut fields = parent.fields.clone();
    fields.extend(variant.fields);

    if let Some(own_title) = variant.title.filter(|t| Some(t) != parent.title.as_ref()) {
        fields.insert(VARIANT_TITLE_FIELD.to_owned(), FieldValue::Text(own_title));
    }

    FeedItem {
        id: variant.id,
        kind: ItemKind::Variant,
        parent_id: Some(parent.id.clone()),
        title: parent.title.clone(),
        link: variant.link.or_else(|| parent.link.clone()),
        price: variant.price.or(parent.price),
        regular_price: variant.regular_price.or(parent.regular_price),
        sale_price: variant.sale_price,
        category_ids: if variant.category_ids.is_empty() {
            parent.category_ids.clone()
        } else {
            variant.category_ids
        },
        categories: Vec::new(),
        variation_attributes: Vec::new(),
        fields,
        variants: Vec::new(),
    }
}

/// Folds variant rows under their parents and cascades pricing.
///
/// Rows with a `parent_id` are attached to the matching top-level row and
/// removed from the top level. A row whose parent is not in `rows` is dropped
/// and recorded on `ctx`. Running the cascade on its own output is a no-op.
pub fn cascade(rows: Vec<FeedItem>, ctx: &mut RequestContext) -> Vec<FeedItem> {
    let (mut top, children): (Vec<FeedItem>, Vec<FeedItem>) =
        rows.into_iter().partition(|r| r.parent_id.is_none());

    let index: HashMap<String, usize> = top
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    for child in children {
        let Some(parent_id) = child.parent_id.clone() else {
            continue;
        };
        match index.get(&parent_id) {
            Some(&i) => {
                let parent = &mut top[i];
                if parent.variants.iter().all(|v| v.id != child.id) {
                    parent.variants.push(child);
                }
            }
            None => ctx.record_missing(MissingReference::VariantParent {
                item_id: child.id,
                parent_id,
            }),
        }
    }

    for row in &mut top {
        cascade_prices(row);
    }

    top
}

/// Copies the pricing of the variant whose sale price equals the parent's
/// minimum price onto the parent.
///
/// Among several matching variants the last one in fetch order wins.
fn cascade_prices(parent: &mut FeedItem) {
    let Some(min_price) = minimum_price(parent) else {
        return;
    };

    let winner = parent
        .variants
        .iter()
        .rev()
        .find(|v| v.sale_price == Some(min_price))
        .map(|v| (v.price, v.regular_price, v.sale_price, v.link.clone()));

    if let Some((price, regular_price, sale_price, link)) = winner {
        parent.price = price;
        parent.regular_price = regular_price;
        parent.sale_price = sale_price;
        parent.link = link;
    }
}

/// Lowest price among the attached variants, or the parent's own price when
/// it has none.
///
/// Depends on variant rows only, which the cascade never modifies.
fn minimum_price(parent: &FeedItem) -> Option<Decimal> {
    if parent.variants.is_empty() {
        return parent.price;
    }
    parent.variants.iter().filter_map(|v| v.price).min()
}

#[cfg(test)]
#[path = "variants_test.rs"]
mod tests;
