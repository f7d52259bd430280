//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! failure record they receive.

use crate::bill::{PageRecord, PageType};
use crate::storage::{RunStatus, StorageError};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Output handler already finalized")]
    Finalized,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A detail page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub bill_id: String,
    pub pagetype: PageType,

    /// The URL that failed
    pub url: String,

    /// Error message
    pub message: String,

    /// Number of attempts made, including the first
    pub attempts: u32,
}

/// Trait for output handlers
///
/// Handlers are only ever called from the coordinator task, one call at a
/// time, so they take `&mut self` and need no locking.
pub trait OutputHandler: Send {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Records a fetched detail page
    fn record_page(&mut self, record: &PageRecord) -> OutputResult<()>;

    /// Records a detail page whose fetch gave up
    fn record_failure(&mut self, failure: &PageFailure) -> OutputResult<()>;

    /// Finalizes the output, performing any cleanup or final writes
    ///
    /// # Arguments
    ///
    /// * `status` - The final status of the crawl run
    fn finalize(&mut self, status: RunStatus) -> OutputResult<()>;
}
