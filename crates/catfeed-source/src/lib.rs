//! Catalog source adapters.
//!
//! A [`CatalogSource`] serves one page of raw records per call. The HTTP
//! adapter talks to the upstream catalog API; the in-memory adapter serves a
//! JSON snapshot with the same filter semantics.

pub mod client;
pub mod error;
pub mod memory;
pub mod pagination;
pub mod types;

mod retry;
mod source;

pub use client::HttpCatalogSource;
pub use error::SourceError;
pub use memory::MemorySource;
pub use pagination::fetch_all;
pub use source::CatalogSource;
pub use types::{CatalogFilters, Page, PageRequest, Resource, SortOrder};
