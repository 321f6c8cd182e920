use super::*;

fn base(url: &str) -> reqwest::Url {
    endpoint::parse_base_url(url).unwrap()
}

#[test]
fn page_url_without_filters() {
    let url = endpoint::page_url(
        &base("https://shop.example.com/api/catalog"),
        Resource::Products,
        1,
        100,
        &CatalogFilters::default(),
    )
    .unwrap();
    assert_eq!(
        url,
        "https://shop.example.com/api/catalog/products?page=1&per_page=100"
    );
}

#[test]
fn page_url_handles_trailing_slash() {
    let url = endpoint::page_url(
        &base("https://shop.example.com/api/catalog/"),
        Resource::Categories,
        2,
        50,
        &CatalogFilters::default(),
    )
    .unwrap();
    assert_eq!(
        url,
        "https://shop.example.com/api/catalog/categories?page=2&per_page=50"
    );
}

#[test]
fn page_url_with_all_filters() {
    let filters = CatalogFilters {
        ids: vec!["1".into(), "2".into()],
        lang: Some("en".into()),
        status: Some("published".into()),
        orderby: Some("id".into()),
        order: Some(crate::types::SortOrder::Desc),
        parent: Some("9".into()),
    };
    let url = endpoint::page_url(
        &base("https://shop.example.com"),
        Resource::Variations,
        3,
        10,
        &filters,
    )
    .unwrap();
    assert_eq!(
        url,
        "https://shop.example.com/variations?page=3&per_page=10&include=1%2C2&lang=en&status=published&orderby=id&order=desc&parent=9"
    );
}

#[test]
fn parse_base_url_rejects_relative() {
    let err = endpoint::parse_base_url("not-a-url").unwrap_err();
    assert!(
        matches!(err, SourceError::InvalidBaseUrl { .. }),
        "expected InvalidBaseUrl, got: {err:?}"
    );
}

#[test]
fn parse_base_url_rejects_cannot_be_a_base() {
    let err = endpoint::parse_base_url("mailto:catalog@example.com").unwrap_err();
    assert!(matches!(err, SourceError::InvalidBaseUrl { .. }));
}

#[test]
fn debug_output_redacts_token() {
    let source = HttpCatalogSource::new(
        "https://shop.example.com",
        5,
        "catfeed-test/0.1",
        Some("top-secret".into()),
        0,
        0,
    )
    .unwrap();
    let debug = format!("{source:?}");
    assert!(!debug.contains("top-secret"));
    assert!(debug.contains("[redacted]"));
}
