mod feeds;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use catfeed_feed::{FeedError, FeedPipeline};
use catfeed_source::CatalogSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, RateLimitState, RequestId, REQUEST_ID_HEADER,
};

/// Shared handler state: the feed pipeline plus the optional feed secret.
pub struct AppState<S> {
    pub pipeline: FeedPipeline<S>,
    /// `Some` when feeds are protected.
    pub feed_secret: Option<Arc<str>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            feed_secret: self.feed_secret.clone(),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(pipeline: FeedPipeline<S>, feed_secret: Option<String>) -> Self {
        Self {
            pipeline,
            feed_secret: feed_secret.map(Arc::from),
        }
    }

    /// Constant-time check of the caller's secret. Unprotected feeds admit
    /// everyone.
    pub(crate) fn authorized(&self, provided: Option<&str>) -> bool {
        let Some(expected) = &self.feed_secret else {
            return true;
        };
        let provided = provided.unwrap_or_default();
        provided.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    version: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "source_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_feed_error(request_id: String, error: &FeedError) -> ApiError {
    if error.is_unavailable() {
        tracing::error!(error = %error, "catalog source unavailable");
        return ApiError::new(request_id, "source_unavailable", "catalog source unavailable");
    }
    tracing::error!(error = %error, "feed request failed");
    ApiError::new(request_id, "internal_error", "feed request failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers([header::CONTENT_TYPE, REQUEST_ID_HEADER])
        .expose_headers([REQUEST_ID_HEADER, feeds::TOTAL_COUNT_HEADER])
}

fn feed_router<S>(rate_limit: RateLimitState) -> Router<AppState<S>>
where
    S: CatalogSource + 'static,
{
    Router::new()
        .route("/feed/products", get(feeds::products_feed::<S>))
        .route("/feed/posts", get(feeds::posts_feed::<S>))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app<S>(state: AppState<S>, rate_limit: RateLimitState) -> Router
where
    S: CatalogSource + 'static,
{
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(feed_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
