use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    /// URL rule overrides, keyed by operation name
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Minimum time between two request starts (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Retries for timeouts and 5xx responses
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before each retry (milliseconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Number of listing rows requested at once
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

fn default_request_delay() -> u64 {
    250
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

pub fn default_page_size() -> u32 {
    150
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// The crawled site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host every rule path is joined onto
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Domain patterns requests may target (e.g., "example.com" or "*.example.com")
    #[serde(rename = "allowed-domains", default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Referer header sent with every request; defaults to the base URL
    #[serde(default)]
    pub referer: Option<String>,
}

impl SiteConfig {
    pub fn referer(&self) -> &str {
        self.referer.as_deref().unwrap_or(&self.base_url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            allowed_domains: default_allowed_domains(),
            referer: None,
        }
    }
}

fn default_base_url() -> String {
    "http://likms.assembly.go.kr".to_string()
}

fn default_allowed_domains() -> Vec<String> {
    vec!["likms.assembly.go.kr".to_string()]
}

/// CSS selectors locating the bill table on the listing page
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Selects candidate rows
    #[serde(default = "default_rows_selector")]
    pub rows: String,

    /// Matched against each row's direct children to find its cells
    #[serde(default = "default_columns_selector")]
    pub columns: String,

    /// Selects the anchor inside the link cell
    #[serde(default = "default_link_selector")]
    pub link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            rows: default_rows_selector(),
            columns: default_columns_selector(),
            link: default_link_selector(),
        }
    }
}

fn default_rows_selector() -> String {
    "table tr".to_string()
}

fn default_columns_selector() -> String {
    "td".to_string()
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

/// Output configuration; at least one destination must be set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving `<bill_id>/<pagetype>.html` files
    #[serde(default)]
    pub directory: Option<String>,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

/// A URL rule: path relative to the base URL plus query parameter names
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub path: String,

    /// Query parameter name -> keyword supplied by the caller
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}
