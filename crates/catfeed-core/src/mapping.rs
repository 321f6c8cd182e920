//! Custom field mapping loaded from a YAML file.
//!
//! ```yaml
//! fields:
//!   - source: pa_color
//!     target: color
//!     kind: taxonomy-list
//!   - source: _gtin
//!     target: gtin
//!     kind: metafield
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Row keys the pipeline owns. A mapping may not write to them.
pub const RESERVED_TARGETS: &[&str] = &[
    "id",
    "kind",
    "parent_id",
    "title",
    "link",
    "price",
    "regular_price",
    "sale_price",
    "categories",
    "category_ids",
    "variants",
    "variation_attributes",
];

/// Where a mapped value is read from and how it is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingKind {
    /// Attribute terms reduced to a list of plain-text names.
    TaxonomyList,
    /// A single value from an attribute or a raw field.
    Scalar,
    /// A value from the item's free-form metadata, looked up by key.
    Metafield,
}

impl std::fmt::Display for MappingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingKind::TaxonomyList => write!(f, "taxonomy-list"),
            MappingKind::Scalar => write!(f, "scalar"),
            MappingKind::Metafield => write!(f, "metafield"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub source: String,
    pub target: String,
    pub kind: MappingKind,
}

/// Ordered list of mapping rules. Order decides which value wins on overlap
/// with a raw field of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default)]
    pub fields: Vec<MappingRule>,
}

impl FieldMapping {
    /// Builds a mapping from rules, applying the same validation as the file loader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on empty, reserved or duplicate targets.
    pub fn new(fields: Vec<MappingRule>) -> Result<Self, ConfigError> {
        let mapping = Self { fields };
        validate_mapping(&mapping)?;
        Ok(mapping)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingRule> {
        self.fields.iter()
    }

    /// Target names in mapping order.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        self.fields.iter().map(|r| r.target.as_str()).collect()
    }
}

/// Load and validate a field mapping from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed (including an
/// unknown `kind`), or fails validation.
pub fn load_field_mapping(path: &Path) -> Result<FieldMapping, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::MappingFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_field_mapping(&content)
}

/// Parse and validate a field mapping from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_field_mapping(content: &str) -> Result<FieldMapping, ConfigError> {
    let mapping: FieldMapping =
        serde_yaml::from_str(content).map_err(ConfigError::MappingFileParse)?;

    validate_mapping(&mapping)?;

    Ok(mapping)
}

fn validate_mapping(mapping: &FieldMapping) -> Result<(), ConfigError> {
    let mut seen_targets = HashSet::new();

    for rule in &mapping.fields {
        if rule.source.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "mapping for target '{}' has an empty source",
                rule.target
            )));
        }

        let target = rule.target.trim();
        if target.is_empty() {
            return Err(ConfigError::Validation(format!(
                "mapping for source '{}' has an empty target",
                rule.source
            )));
        }

        if RESERVED_TARGETS.contains(&target) {
            return Err(ConfigError::Validation(format!(
                "target '{target}' (from source '{}') is reserved",
                rule.source
            )));
        }

        if !seen_targets.insert(target.to_owned()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target field: '{target}'"
            )));
        }
    }

    Ok(())
}
