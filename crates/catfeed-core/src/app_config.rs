use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How prices are presented in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceDisplay {
    /// Prices are exported as stored.
    #[default]
    TaxExclusive,
    /// Prices are grossed up with each item's tax rate.
    TaxInclusive,
}

impl std::fmt::Display for PriceDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceDisplay::TaxExclusive => write!(f, "tax-exclusive"),
            PriceDisplay::TaxInclusive => write!(f, "tax-inclusive"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub source_url: String,
    pub source_token: Option<String>,
    pub source_timeout_secs: u64,
    pub source_user_agent: String,
    pub source_max_retries: u32,
    pub source_retry_backoff_ms: u64,
    pub mapping_path: Option<PathBuf>,
    pub page_size: u32,
    pub variant_page_size: u32,
    pub max_source_pages: usize,
    pub default_status: String,
    pub feed_protected: bool,
    pub feed_secret: Option<String>,
    pub price_display: PriceDisplay,
    pub feed_title: String,
    pub store_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("source_url", &self.source_url)
            .field(
                "source_token",
                &self.source_token.as_ref().map(|_| "[redacted]"),
            )
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("source_user_agent", &self.source_user_agent)
            .field("source_max_retries", &self.source_max_retries)
            .field("source_retry_backoff_ms", &self.source_retry_backoff_ms)
            .field("mapping_path", &self.mapping_path)
            .field("page_size", &self.page_size)
            .field("variant_page_size", &self.variant_page_size)
            .field("max_source_pages", &self.max_source_pages)
            .field("default_status", &self.default_status)
            .field("feed_protected", &self.feed_protected)
            .field(
                "feed_secret",
                &self.feed_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("price_display", &self.price_display)
            .field("feed_title", &self.feed_title)
            .field("store_url", &self.store_url)
            .finish()
    }
}
