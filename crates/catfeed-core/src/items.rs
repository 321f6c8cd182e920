//! Raw catalog records as returned by the upstream catalog API.
//!
//! ## Observed shape
//!
//! ### Prices
//! Upstream stores send prices as JSON numbers (`12.5`), numeric strings
//! (`"12.50"`), empty strings (`""`) for "no sale price", or `null`. Empty
//! strings and `null` both deserialize to `None`; anything else must parse as
//! a decimal or the whole record is rejected.
//!
//! ### Parent references
//! Variations carry the id of their parent in `parent_id`. Some stores send
//! `0` or an empty string for top-level items, which is treated as absent.
//!
//! ### Dynamic fields
//! Anything the pipeline does not know by name lives in `fields`, a sealed map
//! of [`FieldValue`]s. Structured attributes and free-form metadata have their
//! own lists because the field projector looks them up by name and key.
//! Values outside the [`FieldValue`] shapes (`null`, objects, mixed arrays)
//! are dropped while parsing, so one odd entry never rejects the record.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Role of a record in the parent/variant hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Simple,
    Parent,
    Variant,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Simple => write!(f, "simple"),
            ItemKind::Parent => write!(f, "parent"),
            ItemKind::Variant => write!(f, "variant"),
        }
    }
}

/// A dynamic field value.
///
/// Serialized untagged so the JSON shape stays what a client expects:
/// `"red"`, `4.5`, `true`, `["a", "b"]` or `[["a", "b"], ["c"]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Nested(Vec<Vec<String>>),
}

impl FieldValue {
    /// Returns `true` for empty text and empty lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Nested(groups) => groups.is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    /// Flattens the value into display strings, one per output element.
    ///
    /// Nested lists render one string per inner list, joined with `" > "`.
    #[must_use]
    pub fn to_texts(&self) -> Vec<String> {
        match self {
            FieldValue::Bool(b) => vec![b.to_string()],
            FieldValue::Number(n) => vec![n.to_string()],
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::List(items) => items.clone(),
            FieldValue::Nested(groups) => groups.iter().map(|g| g.join(" > ")).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// A structured attribute such as `color: [red, blue]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAttribute {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// `true` when the attribute distinguishes the variants of a parent.
    #[serde(default)]
    pub variation: bool,
}

/// A free-form metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    /// `None` when the stored value is `null` or has no supported shape.
    #[serde(default, deserialize_with = "lenient_value")]
    pub value: Option<FieldValue>,
}

/// A single record fetched from the catalog: a product, a variation or a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    #[serde(default)]
    pub kind: ItemKind,

    /// Parent identifier for variants. `0`, `""` and `null` mean no parent.
    #[serde(default, deserialize_with = "optional_ref")]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default, deserialize_with = "optional_price")]
    pub price: Option<Decimal>,

    #[serde(default, deserialize_with = "optional_price")]
    pub regular_price: Option<Decimal>,

    #[serde(default, deserialize_with = "optional_price")]
    pub sale_price: Option<Decimal>,

    /// Tax rate in percent applied when prices are displayed tax-inclusive.
    #[serde(default, deserialize_with = "optional_price")]
    pub tax_rate: Option<Decimal>,

    #[serde(default)]
    pub category_ids: Vec<String>,

    #[serde(default)]
    pub attributes: Vec<ItemAttribute>,

    #[serde(default)]
    pub meta: Vec<MetaEntry>,

    #[serde(default, deserialize_with = "lenient_fields")]
    pub fields: BTreeMap<String, FieldValue>,
}

impl CatalogItem {
    /// Creates a bare record with no optional fields set.
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
            tax_rate: None,
            category_ids: Vec::new(),
            attributes: Vec::new(),
            meta: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Finds a structured attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&ItemAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Value of the first metadata entry with `key`, if that entry has one.
    #[must_use]
    pub fn meta_value(&self, key: &str) -> Option<&FieldValue> {
        self.meta
            .iter()
            .find(|m| m.key == key)
            .and_then(|m| m.value.as_ref())
    }

    /// Names of the attributes flagged as variation-defining.
    #[must_use]
    pub fn variation_attribute_names(&self) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|a| a.variation)
            .map(|a| a.name.clone())
            .collect()
    }
}

/// A node of the category forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "optional_ref")]
    pub parent_id: Option<String>,
}

impl CategoryNode {
    /// Returns the parent id, or `None` when this node is a root.
    ///
    /// A node pointing at itself is a root.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .filter(|p| !p.is_empty() && *p != self.id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Number(n) => n.to_string(),
    })
}

fn optional_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IdRepr>::deserialize(deserializer)?;
    Ok(raw
        .map(|r| match r {
            IdRepr::Text(s) => s.trim().to_owned(),
            IdRepr::Number(n) => n.to_string(),
        })
        .filter(|s| !s.is_empty() && s != "0"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Text(String),
    Number(Decimal),
}

fn optional_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PriceRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PriceRepr::Number(d)) => Ok(Some(d)),
        Some(PriceRepr::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<Decimal>()
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid price \"{s}\": {e}")))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientValue {
    Known(FieldValue),
    Unsupported(IgnoredAny),
}

impl LenientValue {
    fn known(self) -> Option<FieldValue> {
        match self {
            LenientValue::Known(value) => Some(value),
            LenientValue::Unsupported(_) => None,
        }
    }
}

fn lenient_value<'de, D>(deserializer: D) -> Result<Option<FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LenientValue::deserialize(deserializer)?.known())
}

fn lenient_fields<'de, D>(deserializer: D) -> Result<BTreeMap<String, FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, LenientValue>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| value.known().map(|v| (name, v)))
        .collect())
}

#[cfg(test)]
#[path = "items_test.rs"]
mod tests;
