use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use catfeed_feed::{FeedDocument, FeedKind, FeedRequest, FieldSelection, Format};
use catfeed_source::CatalogSource;
use serde::Deserialize;

use super::{map_feed_error, ApiError, AppState};
use crate::middleware::RequestId;

/// Total matching top-level records, so clients know when to stop paging.
pub(super) const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

#[derive(Debug, Default, Deserialize)]
pub(super) struct FeedQuery {
    pub(super) limit: Option<u32>,
    pub(super) offset: Option<u64>,
    pub(super) format: Option<String>,
    pub(super) fields: Option<String>,
    pub(super) lang: Option<String>,
    pub(super) ids: Option<String>,
    pub(super) secret: Option<String>,
}

impl FeedQuery {
    fn into_request(self, kind: FeedKind) -> Result<FeedRequest, String> {
        let format = match non_empty(self.format) {
            Some(raw) => raw.parse::<Format>()?,
            None => Format::default(),
        };

        Ok(FeedRequest {
            kind,
            format,
            offset: self.offset.unwrap_or(0),
            limit: self.limit,
            fields: self
                .fields
                .as_deref()
                .map_or_else(FieldSelection::all, FieldSelection::parse),
            lang: non_empty(self.lang),
            ids: self
                .ids
                .as_deref()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(super) async fn products_feed<S: CatalogSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FeedQuery>,
) -> Response {
    serve_feed(&state, FeedKind::Products, req_id, query).await
}

pub(super) async fn posts_feed<S: CatalogSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FeedQuery>,
) -> Response {
    serve_feed(&state, FeedKind::Posts, req_id, query).await
}

async fn serve_feed<S: CatalogSource>(
    state: &AppState<S>,
    kind: FeedKind,
    RequestId(request_id): RequestId,
    query: FeedQuery,
) -> Response {
    // A failed secret check looks like an empty feed to the caller.
    if !state.authorized(query.secret.as_deref()) {
        tracing::warn!(feed = %kind, request_id = %request_id, "feed secret rejected");
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, Format::Xml.content_type())],
            String::new(),
        )
            .into_response();
    }

    let request = match query.into_request(kind) {
        Ok(request) => request,
        Err(message) => {
            return ApiError::new(request_id, "validation_error", message).into_response();
        }
    };

    match state.pipeline.run(&request).await {
        Ok(document) => feed_response(document),
        Err(error) => map_feed_error(request_id, &error).into_response(),
    }
}

fn feed_response(document: FeedDocument) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.to_owned()),
            (TOTAL_COUNT_HEADER, document.total.to_string()),
        ],
        document.body,
    )
        .into_response()
}
