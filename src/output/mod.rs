//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing raw page bodies to a directory tree
//! - Recording runs, pages and failures in SQLite
//! - Reporting statistics from the database

mod files;
mod sqlite_output;
pub mod stats;
mod traits;

pub use files::{FileOutput, FAILURES_FILE};
pub use sqlite_output::SqliteOutput;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputHandler, OutputResult, PageFailure};

use crate::config::OutputConfig;
use crate::storage::open_storage;
use crate::LikmsError;
use chrono::NaiveDate;
use std::path::Path;

/// Builds every output handler the configuration asks for
///
/// The SQLite handler starts its run row immediately.
pub fn build_outputs(
    config: &OutputConfig,
    since: NaiveDate,
    config_hash: &str,
) -> Result<Vec<Box<dyn OutputHandler>>, LikmsError> {
    let mut outputs: Vec<Box<dyn OutputHandler>> = Vec::new();

    if let Some(directory) = &config.directory {
        outputs.push(Box::new(FileOutput::new(directory)?));
    }

    if let Some(database_path) = &config.database_path {
        let storage = open_storage(Path::new(database_path))?;
        outputs.push(Box::new(SqliteOutput::new(storage, since, config_hash)?));
    }

    Ok(outputs)
}
