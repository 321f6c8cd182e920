use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached for {resource}: exceeded {max_pages} pages")]
    PaginationLimit { resource: String, max_pages: usize },

    #[error("invalid catalog base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("invalid page request: page {page}, per_page {per_page} (both must be >= 1)")]
    InvalidPage { page: u32, per_page: u32 },
}

impl SourceError {
    /// Returns `true` when the upstream catalog could not be reached or kept
    /// failing: network errors, timeouts, rate limiting and 5xx responses.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            SourceError::Http(_) | SourceError::RateLimited { .. } => true,
            SourceError::UnexpectedStatus { status, .. } => *status >= 500,
            SourceError::Deserialize { .. }
            | SourceError::PaginationLimit { .. }
            | SourceError::InvalidBaseUrl { .. }
            | SourceError::InvalidPage { .. } => false,
        }
    }
}
