//! Catalog-to-feed transformation.
//!
//! A feed page flows through the stages in this order:
//!
//! 1. [`pipeline`] fetches the offset/limit window from a
//!    [`catfeed_source::CatalogSource`];
//! 2. [`projector`] keeps the requested fields and appends mapped ones;
//! 3. [`variants`] expands parents into variant rows and cascades pricing;
//! 4. [`categories`] resolves breadcrumb paths;
//! 5. [`serialize`] renders XML or JSON.

pub mod categories;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod projector;
pub mod serialize;
pub mod text;
pub mod variants;

pub use categories::{resolve_path, PATH_SEPARATOR};
pub use context::RequestContext;
pub use error::{FeedError, MissingReference};
pub use pipeline::{
    clamp_limit, FeedConfig, FeedDocument, FeedKind, FeedPipeline, FeedRequest, PageWindow,
    MAX_LIMIT,
};
pub use projector::{project, FeedItem, FieldSelection, Projector};
pub use serialize::{serialize, ChannelMeta, Format};
pub use variants::{cascade, VariantExpander};
