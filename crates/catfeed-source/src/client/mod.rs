//! HTTP client for the upstream catalog API.

mod endpoint;

use std::time::Duration;

use catfeed_core::AppConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::retry::retry_with_backoff;
use crate::source::{check_page_bounds, CatalogSource};
use crate::types::{CatalogFilters, Page, Resource};

/// Response header carrying the total number of matching records.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// HTTP client for the upstream catalog API.
///
/// Each resource is served at `{base_url}/{resource}` as a JSON array, with
/// the total match count in the `X-Total-Count` header. Transient errors
/// (429, 5xx, timeouts, connection failures) are retried with exponential
/// backoff up to `max_retries` additional attempts.
#[derive(Clone)]
pub struct HttpCatalogSource {
    client: Client,
    base_url: reqwest::Url,
    token: Option<String>,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    backoff_base_ms: u64,
}

impl std::fmt::Debug for HttpCatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogSource")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl HttpCatalogSource {
    /// Creates a client with explicit timeouts, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` is not an absolute
    /// URL that can carry path segments, or [`SourceError::Http`] if the
    /// underlying `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        token: Option<String>,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SourceError> {
        let base_url = endpoint::parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            token,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds the client from the loaded application configuration.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            &config.source_url,
            config.source_timeout_secs,
            &config.source_user_agent,
            config.source_token.clone(),
            config.source_max_retries,
            config.source_retry_backoff_ms,
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    async fn get_page<T>(
        &self,
        resource: Resource,
        page: u32,
        per_page: u32,
        filters: &CatalogFilters,
    ) -> Result<Page<T>, SourceError>
    where
        T: DeserializeOwned,
    {
        check_page_bounds(page, per_page)?;
        let url = endpoint::page_url(&self.base_url, resource, page, per_page, filters)?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let mut request = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json");

                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }

                let response = request.send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(1);
                    return Err(SourceError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(SourceError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                // Read the total before consuming the response body.
                let total_header = response
                    .headers()
                    .get(TOTAL_COUNT_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok());

                let body = response.text().await?;
                let records = serde_json::from_str::<Vec<T>>(&body).map_err(|e| {
                    SourceError::Deserialize {
                        context: format!("{resource} page {page} from {url}"),
                        source: e,
                    }
                })?;

                let total = total_header.unwrap_or(records.len() as u64);
                tracing::debug!(
                    %resource,
                    page,
                    per_page,
                    returned = records.len(),
                    total,
                    "fetched catalog page"
                );

                Ok(Page { records, total })
            }
        })
        .await
    }
}

impl CatalogSource for HttpCatalogSource {
    async fn fetch_page<T>(
        &self,
        resource: Resource,
        page: u32,
        per_page: u32,
        filters: &CatalogFilters,
    ) -> Result<Page<T>, SourceError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_page(resource, page, per_page, filters).await
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
