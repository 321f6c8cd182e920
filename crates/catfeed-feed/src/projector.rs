//! Field projection: raw catalog records to feed rows.
//!
//! A projection keeps the requested subset of an item's fields and then
//! appends every mapped custom field. Mapped fields are appended even when the
//! caller asked for a narrower field set; feed consumers rely on them being
//! present.

use std::collections::BTreeMap;

use catfeed_core::{
    CatalogItem, FieldMapping, FieldValue, ItemKind, MappingKind, MappingRule, PriceDisplay,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::text::clean_list;

/// A projected feed row.
///
/// Variants of a parent are nested under `variants` once the cascade has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: String,
    pub kind: ItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variation_attributes: Vec<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<FeedItem>,
}

impl FeedItem {
    /// A row with only the structural fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            title: None,
            link: None,
            price: None,
            regular_price: None,
            sale_price: None,
            category_ids: Vec::new(),
            categories: Vec::new(),
            variation_attributes: Vec::new(),
            fields: BTreeMap::new(),
            variants: Vec::new(),
        }
    }
}

/// Which fields a caller asked for. Empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    names: Vec<String>,
}

impl FieldSelection {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a selection from field names; blanks are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_owned())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list such as `title,price,color`.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self::from_names(list.split(','))
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn includes(&self, name: &str) -> bool {
        self.is_all() || self.names.iter().any(|n| n == name)
    }

    /// Category ids are kept when either the ids or the resolved paths are asked for.
    fn includes_categories(&self) -> bool {
        self.includes("categories") || self.includes("category_ids")
    }
}

/// Projects catalog items according to the field mapping and price display mode.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    mapping: &'a FieldMapping,
    price_display: PriceDisplay,
}

impl<'a> Projector<'a> {
    #[must_use]
    pub fn new(mapping: &'a FieldMapping, price_display: PriceDisplay) -> Self {
        Self {
            mapping,
            price_display,
        }
    }

    /// Projects one item.
    ///
    /// `id`, `kind` and `parent_id` are always kept. Every other well-known
    /// field and every raw custom field is kept only if `selection` includes
    /// it. Mapped fields are appended last and overwrite raw fields of the
    /// same name.
    #[must_use]
    pub fn project(&self, item: &CatalogItem, selection: &FieldSelection) -> FeedItem {
        let mut row = FeedItem::new(item.id.clone(), item.kind);
        row.parent_id.clone_from(&item.parent_id);

        if selection.includes("title") {
            row.title.clone_from(&item.title);
        }
        if selection.includes("link") {
            row.link.clone_from(&item.link);
        }
        if selection.includes("price") {
            row.price = self.display_price(item.price, item.tax_rate);
        }
        if selection.includes("regular_price") {
            row.regular_price = self.display_price(item.regular_price, item.tax_rate);
        }
        if selection.includes("sale_price") {
            row.sale_price = self.display_price(item.sale_price, item.tax_rate);
        }
        if selection.includes_categories() {
            row.category_ids.clone_from(&item.category_ids);
        }
        if item.kind == ItemKind::Parent && selection.includes("variation_attributes") {
            row.variation_attributes = item.variation_attribute_names();
        }

        row.fields = item
            .fields
            .iter()
            .filter(|(name, _)| selection.includes(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for rule in self.mapping.iter() {
            if let Some(value) = mapped_value(item, rule) {
                row.fields.insert(rule.target.trim().to_owned(), value);
            }
        }

        row
    }

    fn display_price(&self, price: Option<Decimal>, tax_rate: Option<Decimal>) -> Option<Decimal> {
        let price = price?;
        match (self.price_display, tax_rate) {
            (PriceDisplay::TaxInclusive, Some(rate)) => Some(
                (price * (Decimal::ONE + rate / Decimal::ONE_HUNDRED))
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            ),
            _ => Some(price),
        }
    }
}

/// Projects `item` with tax-exclusive prices.
#[must_use]
pub fn project(item: &CatalogItem, mapping: &FieldMapping, selection: &FieldSelection) -> FeedItem {
    Projector::new(mapping, PriceDisplay::TaxExclusive).project(item, selection)
}

/// Resolves one mapping rule against an item. `None` means the field is omitted.
fn mapped_value(item: &CatalogItem, rule: &MappingRule) -> Option<FieldValue> {
    match rule.kind {
        MappingKind::Metafield => item
            .meta_value(&rule.source)
            .filter(|v| !v.is_empty())
            .cloned(),
        MappingKind::TaxonomyList => {
            let names = match item.attribute(&rule.source) {
                Some(attr) => clean_list(attr.options.iter().map(String::as_str)),
                None => {
                    let raw = item.fields.get(&rule.source)?.to_texts();
                    clean_list(raw.iter().map(String::as_str))
                }
            };
            (!names.is_empty()).then_some(FieldValue::List(names))
        }
        MappingKind::Scalar => match item.attribute(&rule.source) {
            Some(attr) => {
                let joined = clean_list(attr.options.iter().map(String::as_str)).join(", ");
                (!joined.is_empty()).then_some(FieldValue::Text(joined))
            }
            None => item
                .fields
                .get(&rule.source)
                .filter(|v| !v.is_empty())
                .cloned(),
        },
    }
}

#[cfg(test)]
#[path = "projector_test.rs"]
mod tests;
