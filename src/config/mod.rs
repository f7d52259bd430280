//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use likms_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Listing page size: {}", config.crawler.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_page_size, Config, CrawlerConfig, OutputConfig, RuleConfig, SelectorConfig,
    SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
