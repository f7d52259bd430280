//! URL helpers for the offsite filter
//!
//! Requests are only sent to hosts listed in the site's allowed domains.

mod domain;
mod matcher;

use url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;

/// Returns true if the URL's host matches one of the allowed domain patterns
///
/// # Examples
///
/// ```
/// use likms_crawler::url::is_allowed_domain;
/// use url::Url;
///
/// let allowed = vec!["*.assembly.go.kr".to_string()];
/// let url = Url::parse("http://likms.assembly.go.kr/bill/jsp/BillDetail.jsp").unwrap();
/// assert!(is_allowed_domain(&url, &allowed));
///
/// let url = Url::parse("http://example.com/").unwrap();
/// assert!(!is_allowed_domain(&url, &allowed));
/// ```
pub fn is_allowed_domain(url: &Url, allowed: &[String]) -> bool {
    match extract_domain(url) {
        Some(domain) => allowed
            .iter()
            .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &domain)),
        None => false,
    }
}
