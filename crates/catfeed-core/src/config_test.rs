use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("CATFEED_SOURCE_URL", "https://shop.example.com/api/catalog");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CATFEED_ENV"));
}

#[test]
fn build_app_config_fails_without_source_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CATFEED_SOURCE_URL"),
        "expected MissingEnvVar(CATFEED_SOURCE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.source_timeout_secs, 30);
    assert_eq!(cfg.source_user_agent, "catfeed/0.1 (catalog-export)");
    assert_eq!(cfg.source_max_retries, 3);
    assert_eq!(cfg.source_retry_backoff_ms, 500);
    assert!(cfg.source_token.is_none());
    assert!(cfg.mapping_path.is_none());
    assert_eq!(cfg.page_size, 100);
    assert_eq!(cfg.variant_page_size, 100);
    assert_eq!(cfg.max_source_pages, 50);
    assert_eq!(cfg.default_status, "published");
    assert!(!cfg.feed_protected);
    assert_eq!(cfg.price_display, PriceDisplay::TaxExclusive);
    assert_eq!(cfg.feed_title, "Product feed");
    assert_eq!(cfg.store_url, "https://shop.example.com/api/catalog");
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("CATFEED_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATFEED_BIND_ADDR"),
        "expected InvalidEnvVar(CATFEED_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_page_size() {
    let mut map = full_env();
    map.insert("CATFEED_PAGE_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATFEED_PAGE_SIZE"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_page_size_override() {
    let mut map = full_env();
    map.insert("CATFEED_PAGE_SIZE", "250");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.page_size, 250);
}

#[test]
fn build_app_config_protected_feed_requires_secret() {
    let mut map = full_env();
    map.insert("CATFEED_FEED_PROTECTED", "true");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CATFEED_FEED_SECRET"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_protected_feed_with_secret() {
    let mut map = full_env();
    map.insert("CATFEED_FEED_PROTECTED", "1");
    map.insert("CATFEED_FEED_SECRET", "s3cret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.feed_protected);
    assert_eq!(cfg.feed_secret.as_deref(), Some("s3cret"));
}

#[test]
fn build_app_config_rejects_invalid_bool() {
    let mut map = full_env();
    map.insert("CATFEED_FEED_PROTECTED", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATFEED_FEED_PROTECTED"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_price_display_inclusive() {
    let mut map = full_env();
    map.insert("CATFEED_PRICE_DISPLAY", "tax-inclusive");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.price_display, PriceDisplay::TaxInclusive);
}

#[test]
fn build_app_config_price_display_invalid() {
    let mut map = full_env();
    map.insert("CATFEED_PRICE_DISPLAY", "gross");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATFEED_PRICE_DISPLAY"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_retry_override_and_invalid() {
    let mut map = full_env();
    map.insert("CATFEED_SOURCE_MAX_RETRIES", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.source_max_retries, 5);

    map.insert("CATFEED_SOURCE_MAX_RETRIES", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATFEED_SOURCE_MAX_RETRIES"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_store_url_override() {
    let mut map = full_env();
    map.insert("CATFEED_STORE_URL", "https://shop.example.com");
    map.insert("CATFEED_MAPPING_PATH", "./config/mapping.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.store_url, "https://shop.example.com");
    assert_eq!(
        cfg.mapping_path.as_deref(),
        Some(std::path::Path::new("./config/mapping.yaml"))
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("CATFEED_SOURCE_TOKEN", "upstream-token");
    map.insert("CATFEED_FEED_SECRET", "feed-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("upstream-token"));
    assert!(!debug.contains("feed-secret"));
    assert!(debug.contains("[redacted]"));
}
