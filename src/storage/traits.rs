//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::bill::{PageRecord, PageType};
use crate::state::PageState;
use crate::storage::{RunRecord, RunStatus, StoredPage};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the `Running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, since: NaiveDate, config_hash: &str) -> StorageResult<i64>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status and finish timestamp of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Page Management =====

    /// Stores a fetched page body, replacing any earlier row for the same page
    fn save_page(&mut self, run_id: i64, record: &PageRecord) -> StorageResult<()>;

    /// Stores a page that could not be fetched
    fn save_failure(
        &mut self,
        run_id: i64,
        bill_id: &str,
        pagetype: PageType,
        message: &str,
    ) -> StorageResult<()>;

    fn get_page(
        &self,
        run_id: i64,
        bill_id: &str,
        pagetype: PageType,
    ) -> StorageResult<Option<StoredPage>>;

    /// Failed pages of a run, ordered by bill and page type
    fn list_failures(&self, run_id: i64) -> StorageResult<Vec<StoredPage>>;

    // ===== Statistics =====

    fn count_pages_by_state(&self, state: PageState) -> StorageResult<u64>;

    fn count_total_pages(&self) -> StorageResult<u64>;

    /// Number of distinct bill ids across all runs
    fn count_bills(&self) -> StorageResult<u64>;
}
