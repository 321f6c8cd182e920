//! Domain types and configuration shared by every catfeed crate.

pub mod app_config;
pub mod config;
pub mod error;
pub mod items;
pub mod mapping;

pub use app_config::{AppConfig, Environment, PriceDisplay};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use items::{CatalogItem, CategoryNode, FieldValue, ItemAttribute, ItemKind, MetaEntry};
pub use mapping::{
    load_field_mapping, parse_field_mapping, FieldMapping, MappingKind, MappingRule,
};
