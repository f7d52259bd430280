//! SQLite-based output handler implementation
//!
//! This module provides an output handler that records pages and failures
//! of one run directly to the SQLite storage backend.

use crate::bill::PageRecord;
use crate::output::traits::{OutputHandler, OutputResult, PageFailure};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use chrono::NaiveDate;

/// SQLite-based output handler
///
/// Opening the handler creates a `running` row in `runs`; finalizing it
/// stamps the final status.
pub struct SqliteOutput {
    storage: SqliteStorage,
    run_id: i64,
}

impl SqliteOutput {
    /// Starts a new run in `storage`
    pub fn new(mut storage: SqliteStorage, since: NaiveDate, config_hash: &str) -> OutputResult<Self> {
        let run_id = storage.create_run(since, config_hash)?;
        tracing::info!("Started run {} in database", run_id);
        Ok(Self { storage, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}

impl OutputHandler for SqliteOutput {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn record_page(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.storage.save_page(self.run_id, record)?;
        Ok(())
    }

    fn record_failure(&mut self, failure: &PageFailure) -> OutputResult<()> {
        let message = format!(
            "{} (url: {}, attempts: {})",
            failure.message, failure.url, failure.attempts
        );
        self.storage
            .save_failure(self.run_id, &failure.bill_id, failure.pagetype, &message)?;
        Ok(())
    }

    fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
        self.storage.finish_run(self.run_id, status)?;
        tracing::info!("Run {} finished: {}", self.run_id, status.to_db_string());
        Ok(())
    }
}
