use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{ConfigError, WebhookConfig};

const DEFAULT_MAX_DEPTH: u32 = 3;
const DEFAULT_MAX_PAGES: u32 = 100;
const DEFAULT_MAX_RPM: u32 = 60;
const DEFAULT_MAX_CONCURRENCY: u32 = 5;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_USER_AGENT: &str = "crawlhub/0.1";

/// An opaque in-process predicate over a discovered URL.
///
/// Per the source's §9 note: `urlFilter` arrives over HTTP as configuration
/// but a function value isn't JSON-deserializable. This is therefore an
/// in-process extension point only — it is never present on a config built
/// from a request body, only on one assembled programmatically.
pub type UrlFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Frozen, validated configuration for one crawl job.
///
/// `url_filter` is intentionally excluded from (de)serialization — see
/// [`UrlFilter`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlConfig {
    pub start_url: Url,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_max_rpm")]
    pub max_requests_per_minute: u32,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_page_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_request_ms: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub respect_robots_txt: bool,
    #[serde(default)]
    pub sitemap_url: Option<String>,
    #[serde(skip)]
    pub url_filter: Option<UrlFilter>,
    pub webhook: WebhookConfig,
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}
fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}
fn default_max_rpm() -> u32 {
    DEFAULT_MAX_RPM
}
fn default_max_concurrency() -> u32 {
    DEFAULT_MAX_CONCURRENCY
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl std::fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("start_url", &self.start_url)
            .field("max_depth", &self.max_depth)
            .field("max_pages", &self.max_pages)
            .field("max_requests_per_minute", &self.max_requests_per_minute)
            .field("max_concurrency", &self.max_concurrency)
            .field("respect_robots_txt", &self.respect_robots_txt)
            .field("sitemap_url", &self.sitemap_url)
            .field("has_url_filter", &self.url_filter.is_some())
            .finish()
    }
}

impl CrawlConfig {
    pub fn builder() -> CrawlConfigBuilder<NeedsStartUrl> {
        CrawlConfigBuilder::new()
    }
}

// --- typestate builder --------------------------------------------------
//
// Mirrors the teacher's `CrawlConfigBuilder<State>` pattern: required fields
// are encoded as marker types so `.build()` only type-checks once both
// `start_url` and `webhook` have been supplied, in that order.

pub struct NeedsStartUrl;
pub struct NeedsWebhook;
pub struct Ready;

pub struct CrawlConfigBuilder<State> {
    start_url: Option<Url>,
    max_depth: u32,
    max_pages: u32,
    max_requests_per_minute: u32,
    max_concurrency: u32,
    timeout_page_ms: u64,
    timeout_request_ms: u64,
    headers: HashMap<String, String>,
    user_agent: String,
    respect_robots_txt: bool,
    sitemap_url: Option<String>,
    url_filter: Option<UrlFilter>,
    webhook: Option<WebhookConfig>,
    _state: PhantomData<State>,
}

impl CrawlConfigBuilder<NeedsStartUrl> {
    fn new() -> Self {
        Self {
            start_url: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            max_requests_per_minute: DEFAULT_MAX_RPM,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_page_ms: DEFAULT_TIMEOUT_MS,
            timeout_request_ms: DEFAULT_TIMEOUT_MS,
            headers: HashMap::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            respect_robots_txt: false,
            sitemap_url: None,
            url_filter: None,
            webhook: None,
            _state: PhantomData,
        }
    }

    /// Accepts either a bare domain (`example.com`, normalized by prefixing
    /// `https://`, falling back to `http://`) or a full URL.
    pub fn start_url(self, raw: &str) -> Result<CrawlConfigBuilder<NeedsWebhook>, ConfigError> {
        let url = parse_start_url(raw)?;
        Ok(CrawlConfigBuilder {
            start_url: Some(url),
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            max_requests_per_minute: self.max_requests_per_minute,
            max_concurrency: self.max_concurrency,
            timeout_page_ms: self.timeout_page_ms,
            timeout_request_ms: self.timeout_request_ms,
            headers: self.headers,
            user_agent: self.user_agent,
            respect_robots_txt: self.respect_robots_txt,
            sitemap_url: self.sitemap_url,
            url_filter: self.url_filter,
            webhook: self.webhook,
            _state: PhantomData,
        })
    }
}

impl CrawlConfigBuilder<NeedsWebhook> {
    pub fn webhook(self, webhook: WebhookConfig) -> CrawlConfigBuilder<Ready> {
        CrawlConfigBuilder {
            start_url: self.start_url,
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            max_requests_per_minute: self.max_requests_per_minute,
            max_concurrency: self.max_concurrency,
            timeout_page_ms: self.timeout_page_ms,
            timeout_request_ms: self.timeout_request_ms,
            headers: self.headers,
            user_agent: self.user_agent,
            respect_robots_txt: self.respect_robots_txt,
            sitemap_url: self.sitemap_url,
            url_filter: self.url_filter,
            webhook: Some(webhook),
            _state: PhantomData,
        }
    }
}

// Fields valid to set at any stage of the chain.
impl<State> CrawlConfigBuilder<State> {
    pub fn max_depth(mut self, v: u32) -> Self {
        self.max_depth = v;
        self
    }
    pub fn max_pages(mut self, v: u32) -> Self {
        self.max_pages = v;
        self
    }
    pub fn max_requests_per_minute(mut self, v: u32) -> Self {
        self.max_requests_per_minute = v;
        self
    }
    pub fn max_concurrency(mut self, v: u32) -> Self {
        self.max_concurrency = v;
        self
    }
    pub fn timeout_page_ms(mut self, v: u64) -> Self {
        self.timeout_page_ms = v;
        self
    }
    pub fn timeout_request_ms(mut self, v: u64) -> Self {
        self.timeout_request_ms = v;
        self
    }
    pub fn headers(mut self, v: HashMap<String, String>) -> Self {
        self.headers = v;
        self
    }
    pub fn user_agent(mut self, v: impl Into<String>) -> Self {
        self.user_agent = v.into();
        self
    }
    pub fn respect_robots_txt(mut self, v: bool) -> Self {
        self.respect_robots_txt = v;
        self
    }
    pub fn sitemap_url(mut self, v: Option<String>) -> Self {
        self.sitemap_url = v;
        self
    }
    pub fn url_filter(mut self, f: UrlFilter) -> Self {
        self.url_filter = Some(f);
        self
    }
}

impl CrawlConfigBuilder<Ready> {
    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        let cfg = CrawlConfig {
            start_url: self.start_url.expect("Ready implies start_url set"),
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            max_requests_per_minute: self.max_requests_per_minute,
            max_concurrency: self.max_concurrency,
            timeout_page_ms: self.timeout_page_ms,
            timeout_request_ms: self.timeout_request_ms,
            headers: self.headers,
            user_agent: self.user_agent,
            respect_robots_txt: self.respect_robots_txt,
            sitemap_url: self.sitemap_url,
            url_filter: self.url_filter,
            webhook: self.webhook.expect("Ready implies webhook set"),
        };
        validate(&cfg)?;
        Ok(cfg)
    }
}

fn parse_start_url(raw: &str) -> Result<Url, ConfigError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some() => Ok(url),
        _ => {
            let fallback = format!("http://{raw}");
            Url::parse(&fallback)
                .ok()
                .filter(|u| u.host_str().is_some())
                .ok_or_else(|| ConfigError::InvalidDomain(raw.to_string()))
        }
    }
}

fn validate(cfg: &CrawlConfig) -> Result<(), ConfigError> {
    range_check("maxDepth", cfg.max_depth as i64, 1, 10)?;
    range_check("maxPages", cfg.max_pages as i64, 1, 1000)?;
    range_check(
        "maxRequestsPerMinute",
        cfg.max_requests_per_minute as i64,
        1,
        300,
    )?;
    range_check("maxConcurrency", cfg.max_concurrency as i64, 1, 100)?;
    range_check("timeout.page", cfg.timeout_page_ms as i64, 1000, 60_000)?;
    range_check(
        "timeout.request",
        cfg.timeout_request_ms as i64,
        1000,
        60_000,
    )?;
    cfg.webhook.validate()?;
    Ok(())
}

fn range_check(field: &'static str, actual: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if actual < min || actual > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_start_url_then_webhook_in_order() {
        let cfg = CrawlConfig::builder()
            .start_url("example.com")
            .unwrap()
            .webhook(WebhookConfig {
                url: "https://hooks.example.com/cb".into(),
                headers: HashMap::new(),
                retries: 3,
                on: None,
            })
            .max_depth(2)
            .build()
            .unwrap();
        assert_eq!(cfg.start_url.host_str(), Some("example.com"));
        assert_eq!(cfg.max_depth, 2);
    }

    #[test]
    fn rejects_out_of_range_depth() {
        let err = CrawlConfig::builder()
            .start_url("example.com")
            .unwrap()
            .webhook(WebhookConfig {
                url: "https://hooks.example.com/cb".into(),
                headers: HashMap::new(),
                retries: 3,
                on: None,
            })
            .max_depth(11)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "maxDepth", .. }));
    }

    #[test]
    fn rejects_invalid_domain() {
        let err = CrawlConfig::builder().start_url("not a domain").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDomain(_)));
    }
}
