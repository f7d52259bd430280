use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, RuleConfig, SiteConfig, UserAgentConfig,
};
use crate::crawler::RowRule;
use crate::url::is_allowed_domain;
use crate::ConfigError;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    validate_rules(&config.rules)?;
    RowRule::from_config(&config.selectors)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1s".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "page_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates the crawled site's base URL and domain allow-list
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if config.allowed_domains.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_domains must list at least one domain".to_string(),
        ));
    }

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    // the listing request targets the base URL host
    if !is_allowed_domain(&base, &config.allowed_domains) {
        return Err(ConfigError::Validation(format!(
            "base_url host '{}' does not match any of allowed_domains ({})",
            base.host_str().unwrap_or_default(),
            config.allowed_domains.join(", ")
        )));
    }

    if let Some(referer) = &config.referer {
        Url::parse(referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_none() && config.database_path.is_none() {
        return Err(ConfigError::Validation(
            "output needs a directory or a database_path".to_string(),
        ));
    }

    if matches!(config.directory.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "directory cannot be empty".to_string(),
        ));
    }

    if matches!(config.database_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates URL rule overrides
fn validate_rules(rules: &BTreeMap<String, RuleConfig>) -> Result<(), ConfigError> {
    for (operation, rule) in rules {
        if operation.is_empty() {
            return Err(ConfigError::Validation(
                "rule operation name cannot be empty".to_string(),
            ));
        }

        if !rule.path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "rule '{}' path must start with '/', got '{}'",
                operation, rule.path
            )));
        }

        for (name, keyword) in &rule.query {
            if name.is_empty() || keyword.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rule '{}' has an empty query parameter or keyword",
                    operation
                )));
            }
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    fn create_test_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                max_concurrent_requests: 4,
                request_delay: 100,
                max_retries: 2,
                retry_delay: 100,
                request_timeout: 10,
                page_size: 150,
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            site: SiteConfig::default(),
            selectors: SelectorConfig::default(),
            output: OutputConfig {
                directory: Some("./data".to_string()),
                database_path: None,
            },
            rules: BTreeMap::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_page_size_must_be_positive() {
        let mut config = create_test_config();
        config.crawler.page_size = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_output_requires_a_destination() {
        let mut config = create_test_config();
        config.output.directory = None;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.output.database_path = Some("./bills.db".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_base_url_scheme() {
        let mut config = create_test_config();
        config.site.base_url = "ftp://likms.assembly.go.kr".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.site.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_base_url_host_must_be_allowed() {
        let mut config = create_test_config();
        config.site.base_url = "http://127.0.0.1:8080".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.site.allowed_domains = vec!["127.0.0.1".to_string()];
        assert!(validate(&config).is_ok());

        config.site.base_url = "http://likms.assembly.go.kr".to_string();
        config.site.allowed_domains = vec!["*.assembly.go.kr".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = create_test_config();
        config.selectors.rows = "!!".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_rule_path_must_be_absolute() {
        let mut config = create_test_config();
        config.rules.insert(
            "bill-spec".to_string(),
            RuleConfig {
                path: "detail.jsp".to_string(),
                query: BTreeMap::new(),
            },
        );
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("likms.assembly.go.kr").is_ok());
        assert!(validate_domain_pattern("*.assembly.go.kr").is_ok());
        assert!(validate_domain_pattern("127.0.0.1").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("localhost").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
