//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking
//! - Page bodies and fetch failures per run

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::bill::PageType;
use crate::state::PageState;
use crate::LikmsError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, LikmsError> {
    SqliteStorage::new(path)
}

/// A detail page row in the database
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub id: i64,
    pub run_id: i64,
    pub bill_id: String,
    pub pagetype: PageType,
    pub state: PageState,
    pub body: Option<Vec<u8>>,
    pub error_message: Option<String>,
    pub recorded_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    /// Listing date filter of the run, `YYYY-MM-DD`
    pub since_date: String,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
