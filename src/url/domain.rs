use url::Url;

/// Extracts the lowercase host from a URL
///
/// Returns `None` for URLs without a host (e.g. `data:` URLs).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use likms_crawler::url::extract_domain;
///
/// let url = Url::parse("http://LIKMS.assembly.go.kr/bill").unwrap();
/// assert_eq!(extract_domain(&url), Some("likms.assembly.go.kr".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
