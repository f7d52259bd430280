/// Checks if a domain matches an allowed-domain pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact: "likms.assembly.go.kr" matches only itself
/// 2. Wildcard: "*.assembly.go.kr" matches "assembly.go.kr" and any subdomain
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use likms_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("likms.assembly.go.kr", "likms.assembly.go.kr"));
/// assert!(matches_wildcard("*.assembly.go.kr", "likms.assembly.go.kr"));
/// assert!(!matches_wildcard("*.assembly.go.kr", "assembly.go.kr.evil.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .map_or(false, |prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("likms.assembly.go.kr", "likms.assembly.go.kr"));
        assert!(!matches_wildcard("likms.assembly.go.kr", "assembly.go.kr"));
        assert!(!matches_wildcard("assembly.go.kr", "likms.assembly.go.kr"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_subdomains() {
        assert!(matches_wildcard("*.assembly.go.kr", "assembly.go.kr"));
        assert!(matches_wildcard("*.assembly.go.kr", "likms.assembly.go.kr"));
        assert!(matches_wildcard("*.assembly.go.kr", "a.b.assembly.go.kr"));
    }

    #[test]
    fn test_wildcard_rejects_lookalikes() {
        assert!(!matches_wildcard("*.assembly.go.kr", "myassembly.go.kr"));
        assert!(!matches_wildcard("*.assembly.go.kr", "assembly.go.kr.example.com"));
        assert!(!matches_wildcard("*.assembly.go.kr", ""));
    }
}
