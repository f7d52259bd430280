//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests returning the raw body bytes
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Raw page body
        body: Vec<u8>,
    },

    /// Non-success HTTP status
    HttpError {
        status_code: u16,
        /// Whether another attempt may succeed (5xx)
        retryable: bool,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether another attempt may succeed (timeouts)
        retryable: bool,
    },
}

impl FetchResult {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Success { .. } => false,
            Self::HttpError { retryable, .. } | Self::NetworkError { retryable, .. } => *retryable,
        }
    }

    /// Human-readable reason for a failed fetch
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status_code, .. } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error, .. } => Some(error.clone()),
        }
    }
}

/// How often and how patiently a failed fetch is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use likms_crawler::config::{CrawlerConfig, UserAgentConfig};
/// use likms_crawler::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "LikmsCrawler".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
/// let crawler = CrawlerConfig {
///     max_concurrent_requests: 4,
///     request_delay: 250,
///     max_retries: 3,
///     retry_delay: 5000,
///     request_timeout: 30,
///     page_size: 150,
/// };
///
/// let client = build_http_client(&user_agent, &crawler).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once
///
/// # Error classification
///
/// | Condition | Retryable |
/// |-----------|-----------|
/// | HTTP 5xx | yes |
/// | Timeout | yes |
/// | HTTP 404 / other 4xx | no |
/// | Connection refused | no |
/// | Anything else | no |
pub async fn fetch_url(client: &Client, url: &Url, headers: &HeaderMap) -> FetchResult {
    let response = match client.get(url.clone()).headers(headers.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            retryable: status.is_server_error(),
        };
    }

    let final_url = response.url().clone();
    match response.bytes().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body: body.to_vec(),
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            retryable: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            retryable: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            retryable: false,
        }
    }
}

/// Fetches a URL, retrying transient failures
///
/// Returns the final result and the number of attempts made.
pub async fn fetch_with_retry(
    client: &Client,
    url: &Url,
    headers: &HeaderMap,
    policy: RetryPolicy,
) -> (FetchResult, u32) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let result = fetch_url(client, url, headers).await;

        if !result.is_retryable() || attempts > policy.max_retries {
            return (result, attempts);
        }

        tracing::debug!(
            "Attempt {} for {} failed ({}), retrying in {:?}",
            attempts,
            url,
            result.failure_message().unwrap_or_default(),
            policy.delay
        );
        tokio::time::sleep(policy.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> (UserAgentConfig, CrawlerConfig) {
        (
            UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            CrawlerConfig {
                max_concurrent_requests: 2,
                request_delay: 0,
                max_retries: 2,
                retry_delay: 100,
                request_timeout: 5,
                page_size: 150,
            },
        )
    }

    #[test]
    fn test_build_http_client() {
        let (user_agent, crawler) = create_test_config();
        assert!(build_http_client(&user_agent, &crawler).is_ok());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let (_, crawler) = create_test_config();
        let policy = RetryPolicy::from_config(&crawler);
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay, Duration::from_millis(100));
    }

    #[test]
    fn test_retryable_classification() {
        let server_error = FetchResult::HttpError {
            status_code: 503,
            retryable: true,
        };
        let not_found = FetchResult::HttpError {
            status_code: 404,
            retryable: false,
        };
        assert!(server_error.is_retryable());
        assert!(!not_found.is_retryable());
        assert_eq!(not_found.failure_message().as_deref(), Some("HTTP 404"));

        let success = FetchResult::Success {
            final_url: Url::parse("http://likms.assembly.go.kr/").unwrap(),
            status_code: 200,
            body: Vec::new(),
        };
        assert!(!success.is_retryable());
        assert!(success.failure_message().is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_is_not_retried() {
        let (user_agent, mut crawler) = create_test_config();
        crawler.request_timeout = 2;
        let client = build_http_client(&user_agent, &crawler).unwrap();

        // nothing listens on port 1
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let policy = RetryPolicy {
            max_retries: 3,
            delay: Duration::from_millis(10),
        };
        let (result, attempts) = fetch_with_retry(&client, &url, &HeaderMap::new(), policy).await;

        assert!(matches!(
            result,
            FetchResult::NetworkError {
                retryable: false,
                ..
            }
        ));
        assert_eq!(attempts, 1);
    }
}
