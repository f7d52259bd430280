//! likms-crawler: new-bill crawler for the National Assembly legislative
//! information system
//!
//! This crate fetches the listing of bills filed since a given date, fans each
//! bill out into its four detail pages (specification, summary, proposers,
//! withdrawers) and hands the raw page bodies to output handlers.

pub mod bill;
pub mod config;
pub mod crawler;
pub mod output;
pub mod rules;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum LikmsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Request to {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition for bill {bill_id} page {pagetype}: {from:?} -> {to:?}")]
    InvalidTransition {
        bill_id: String,
        pagetype: bill::PageType,
        from: Option<state::PageState>,
        to: state::PageState,
    },

    #[error("Crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Unknown URL operation: {0}")]
    UnknownOperation(String),

    #[error("URL operation '{operation}' requires parameter '{param}'")]
    MissingParameter { operation: String, param: String },
}

/// Errors raised while extracting bill ids from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("row {row}: bill id column is empty")]
    EmptyBillId { row: usize },

    #[error("row {row}: link column has no anchor with an href")]
    MissingLink { row: usize },

    #[error("row {row}: expected at least 3 word tokens in href '{href}'")]
    MalformedHref { row: usize, href: String },
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, LikmsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use bill::{BillReference, PageMeta, PageRecord, PageRequest, PageType};
pub use config::Config;
pub use rules::RuleRegistry;
pub use state::PageState;
