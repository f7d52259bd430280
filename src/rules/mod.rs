//! URL rule engine
//!
//! Maps an operation name plus keyword parameters to a fully qualified URL.
//! Each rule is a path relative to the site base URL and an ordered set of
//! query parameters, each filled from a caller-supplied keyword.
//!
//! # Example
//!
//! ```
//! use likms_crawler::rules::RuleRegistry;
//! use url::Url;
//!
//! let registry = RuleRegistry::new(Url::parse("http://likms.assembly.go.kr").unwrap());
//! let url = registry.url("bill-spec", &[("link_id", "L1A2B3")]).unwrap();
//! assert_eq!(
//!     url.as_str(),
//!     "http://likms.assembly.go.kr/bill/jsp/BillDetail.jsp?bill_id=L1A2B3"
//! );
//! ```

use crate::config::{Config, RuleConfig};
use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use url::Url;

/// Operation building the "new bills since date" listing URL
pub const NEW_BILL_LIST: &str = "new-bill-list";

/// A single URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRule {
    /// Path joined onto the base URL
    pub path: String,

    /// Query parameter name -> keyword, emitted in name order
    pub query: BTreeMap<String, String>,
}

impl UrlRule {
    pub fn new(path: &str, query: &[(&str, &str)]) -> Self {
        Self {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(name, keyword)| (name.to_string(), keyword.to_string()))
                .collect(),
        }
    }
}

impl From<&RuleConfig> for UrlRule {
    fn from(config: &RuleConfig) -> Self {
        Self {
            path: config.path.clone(),
            query: config.query.clone(),
        }
    }
}

/// Registry of URL rules keyed by operation name
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    base: Url,
    rules: BTreeMap<String, UrlRule>,
}

impl RuleRegistry {
    /// Creates a registry holding the five built-in rules
    pub fn new(base: Url) -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(
            NEW_BILL_LIST.to_string(),
            UrlRule::new(
                "/bill/jsp/BillSearchResult.jsp",
                &[("PROPOSE_FROM", "date_since"), ("PAGE_SIZE", "size")],
            ),
        );
        rules.insert(
            "bill-spec".to_string(),
            UrlRule::new("/bill/jsp/BillDetail.jsp", &[("bill_id", "link_id")]),
        );
        rules.insert(
            "bill-summary".to_string(),
            UrlRule::new("/bill/jsp/SummaryPopup.jsp", &[("bill_id", "link_id")]),
        );
        rules.insert(
            "bill-proposers".to_string(),
            UrlRule::new("/bill/jsp/CoactorListPopup.jsp", &[("bill_id", "link_id")]),
        );
        rules.insert(
            "bill-withdrawers".to_string(),
            UrlRule::new("/bill/jsp/ReturnListPopup.jsp", &[("bill_id", "link_id")]),
        );

        Self { base, rules }
    }

    /// Builds the registry for a configuration: built-ins overlaid with `[rules]`
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let base = Url::parse(&config.site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        let mut registry = Self::new(base);
        for (operation, rule) in &config.rules {
            registry.insert(operation, UrlRule::from(rule));
        }

        Ok(registry)
    }

    /// Adds or replaces the rule for an operation
    pub fn insert(&mut self, operation: &str, rule: UrlRule) {
        self.rules.insert(operation.to_string(), rule);
    }

    pub fn get(&self, operation: &str) -> Option<&UrlRule> {
        self.rules.get(operation)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Registered operation names, sorted
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Builds the URL for `operation`, filling query parameters from `params`
    ///
    /// Keywords the rule does not reference are ignored.
    ///
    /// # Errors
    ///
    /// * `ConfigError::UnknownOperation` - No rule is registered under `operation`
    /// * `ConfigError::MissingParameter` - The rule needs a keyword absent from `params`
    pub fn url(&self, operation: &str, params: &[(&str, &str)]) -> ConfigResult<Url> {
        let rule = self
            .rules
            .get(operation)
            .ok_or_else(|| ConfigError::UnknownOperation(operation.to_string()))?;

        let mut pairs = Vec::with_capacity(rule.query.len());
        for (name, keyword) in &rule.query {
            let value = params
                .iter()
                .find(|(key, _)| key == keyword)
                .map(|(_, value)| *value)
                .ok_or_else(|| ConfigError::MissingParameter {
                    operation: operation.to_string(),
                    param: keyword.clone(),
                })?;
            pairs.push((name.as_str(), value));
        }

        let mut url = self.base.join(&rule.path).map_err(|e| {
            ConfigError::InvalidUrl(format!("rule '{}' path '{}': {}", operation, rule.path, e))
        })?;

        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }
}
