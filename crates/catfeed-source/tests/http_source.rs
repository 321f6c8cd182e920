//! Integration tests for `HttpCatalogSource`.
//!
//! Each test stands up a `wiremock` server, so no real network traffic is
//! made. Covers page requests, the total-count header, pagination through
//! `fetch_all`, and the error variants a page request can produce.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catfeed_source::{
    fetch_all, CatalogFilters, CatalogSource, HttpCatalogSource, Page, Resource, SourceError,
};

/// Test client: 5-second timeout, no retries.
fn test_source(base: &str) -> HttpCatalogSource {
    HttpCatalogSource::new(base, 5, "catfeed-test/0.1", None, 0, 0)
        .expect("failed to build test HttpCatalogSource")
}

fn product(id: u32) -> serde_json::Value {
    json!({"id": id.to_string(), "kind": "simple", "title": format!("Product {id}"), "price": "9.99"})
}

// ---------------------------------------------------------------------------
// Single pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_reads_records_and_total_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([product(1), product(2)]))
                .insert_header("X-Total-Count", "7"),
        )
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let page: Page<catfeed_core::CatalogItem> = source
        .fetch_page(Resource::Products, 1, 2, &CatalogFilters::default())
        .await
        .expect("page request should succeed");

    assert_eq!(page.total, 7);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].id, "1");
    assert_eq!(page.records[1].title.as_deref(), Some("Product 2"));
}

#[tokio::test]
async fn missing_total_header_falls_back_to_page_length() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "p1"}])))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let page: Page<serde_json::Value> = source
        .fetch_page(Resource::Posts, 1, 10, &CatalogFilters::default())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn empty_array_is_an_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .insert_header("X-Total-Count", "0"),
        )
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let filters = CatalogFilters {
        ids: vec!["999".into()],
        ..CatalogFilters::default()
    };
    let page: Page<serde_json::Value> = source
        .fetch_page(Resource::Products, 1, 10, &filters)
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn filters_are_sent_as_query_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/variations"))
        .and(query_param("parent", "42"))
        .and(query_param("lang", "de"))
        .and(query_param("status", "published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let filters = CatalogFilters {
        lang: Some("de".into()),
        status: Some("published".into()),
        ..CatalogFilters::default()
    }
    .for_parent("42");
    let page: Page<serde_json::Value> = source
        .fetch_page(Resource::Variations, 1, 100, &filters)
        .await
        .unwrap();

    assert!(page.is_empty());
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpCatalogSource::new(
        &server.uri(),
        5,
        "catfeed-test/0.1",
        Some("s3cret".into()),
        0,
        0,
    )
    .unwrap();
    let result: Result<Page<serde_json::Value>, _> = source
        .fetch_page(Resource::Categories, 1, 10, &CatalogFilters::default())
        .await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_all_walks_pages_until_a_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product(1), product(2)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product(3)])))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let all: Vec<serde_json::Value> = fetch_all(
        &source,
        Resource::Products,
        2,
        10,
        &CatalogFilters::default(),
    )
    .await
    .unwrap();

    assert_eq!(all.len(), 3);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_is_returned_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpCatalogSource::new(&server.uri(), 5, "catfeed-test/0.1", None, 3, 1)
        .unwrap();
    let result: Result<Page<serde_json::Value>, _> = source
        .fetch_page(Resource::Products, 1, 10, &CatalogFilters::default())
        .await;

    match result {
        Err(err @ SourceError::UnexpectedStatus { status: 404, .. }) => {
            assert!(!err.is_unavailable());
        }
        other => panic!("expected UnexpectedStatus 404, got: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    // Mounted first so it is matched first; exhausted after one response.
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product(1)])))
        .mount(&server)
        .await;

    let source = HttpCatalogSource::new(&server.uri(), 5, "catfeed-test/0.1", None, 2, 1)
        .unwrap();
    let page: Page<serde_json::Value> = source
        .fetch_page(Resource::Products, 1, 10, &CatalogFilters::default())
        .await
        .expect("second attempt should succeed");

    assert_eq!(page.records.len(), 1);
}

#[tokio::test]
async fn persistent_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let err = source
        .fetch_page::<serde_json::Value>(Resource::Products, 1, 10, &CatalogFilters::default())
        .await
        .unwrap_err();

    assert!(err.is_unavailable(), "expected unavailable, got: {err:?}");
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let err = source
        .fetch_page::<serde_json::Value>(Resource::Products, 1, 10, &CatalogFilters::default())
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            SourceError::RateLimited {
                retry_after_secs: 7,
                ..
            }
        ),
        "expected RateLimited, got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let err = source
        .fetch_page::<serde_json::Value>(Resource::Products, 1, 10, &CatalogFilters::default())
        .await
        .unwrap_err();

    assert!(
        matches!(err, SourceError::Deserialize { .. }),
        "expected Deserialize, got: {err:?}"
    );
}

#[tokio::test]
async fn zero_page_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let source = test_source(&server.uri());
    let err = source
        .fetch_page::<serde_json::Value>(Resource::Products, 0, 10, &CatalogFilters::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SourceError::InvalidPage { .. }));
}
