use crate::app_config::{AppConfig, Environment, PriceDisplay};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup, and so callers can supply values the environment lacks.
///
/// # Errors
///
/// Returns `ConfigError` if required vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional =
        |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let positive_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("CATFEED_ENV", "development"))?;
    let bind_addr = parse("CATFEED_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CATFEED_LOG_LEVEL", "info");

    let source_url = require("CATFEED_SOURCE_URL")?;
    let source_token = optional("CATFEED_SOURCE_TOKEN");
    let source_timeout_secs = parse_u64("CATFEED_SOURCE_TIMEOUT_SECS", "30")?;
    let source_user_agent =
        or_default("CATFEED_SOURCE_USER_AGENT", "catfeed/0.1 (catalog-export)");
    let source_max_retries = parse_u32("CATFEED_SOURCE_MAX_RETRIES", "3")?;
    let source_retry_backoff_ms = parse_u64("CATFEED_SOURCE_RETRY_BACKOFF_MS", "500")?;

    let mapping_path = optional("CATFEED_MAPPING_PATH").map(PathBuf::from);
    let page_size = positive_u32("CATFEED_PAGE_SIZE", "100")?;
    let variant_page_size = positive_u32("CATFEED_VARIANT_PAGE_SIZE", "100")?;
    let max_source_pages = parse_usize("CATFEED_MAX_SOURCE_PAGES", "50")?;
    let default_status = or_default("CATFEED_DEFAULT_STATUS", "published");

    let feed_protected = parse_bool(
        "CATFEED_FEED_PROTECTED",
        &or_default("CATFEED_FEED_PROTECTED", "false"),
    )?;
    let feed_secret = optional("CATFEED_FEED_SECRET");
    if feed_protected && feed_secret.is_none() {
        return Err(ConfigError::MissingEnvVar("CATFEED_FEED_SECRET".to_string()));
    }

    let price_display =
        parse_price_display(&or_default("CATFEED_PRICE_DISPLAY", "tax-exclusive"))?;
    let feed_title = or_default("CATFEED_FEED_TITLE", "Product feed");
    let store_url = optional("CATFEED_STORE_URL").unwrap_or_else(|| source_url.clone());

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        source_url,
        source_token,
        source_timeout_secs,
        source_user_agent,
        source_max_retries,
        source_retry_backoff_ms,
        mapping_path,
        page_size,
        variant_page_size,
        max_source_pages,
        default_status,
        feed_protected,
        feed_secret,
        price_display,
        feed_title,
        store_url,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATFEED_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_price_display(s: &str) -> Result<PriceDisplay, ConfigError> {
    match s {
        "tax-exclusive" => Ok(PriceDisplay::TaxExclusive),
        "tax-inclusive" => Ok(PriceDisplay::TaxInclusive),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATFEED_PRICE_DISPLAY".to_string(),
            reason: format!("expected tax-inclusive or tax-exclusive, got \"{other}\""),
        }),
    }
}

fn parse_bool(var: &str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
