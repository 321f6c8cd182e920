use catfeed_source::SourceError;
use thiserror::Error;

/// Errors that abort a feed request.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("catalog source error: {0}")]
    Source(#[from] SourceError),

    #[error("failed to render XML feed: {0}")]
    Render(#[from] std::io::Error),

    #[error("failed to render JSON feed: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// `true` when the upstream catalog could not be queried.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FeedError::Source(e) if e.is_unavailable())
    }
}

/// A reference that could not be followed while building a page.
///
/// Never fatal: the affected row is dropped or the path truncated, and the
/// miss is recorded on the request context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingReference {
    #[error("item {item_id} references parent {parent_id}, which is not on this page")]
    VariantParent { item_id: String, parent_id: String },

    #[error("category {category_id} does not exist")]
    CategoryLeaf { category_id: String },

    #[error("category {category_id} has missing ancestor {missing_id}")]
    CategoryAncestor {
        category_id: String,
        missing_id: String,
    },

    #[error("category {category_id} is part of a cycle through {repeated_id}")]
    CategoryCycle {
        category_id: String,
        repeated_id: String,
    },
}
