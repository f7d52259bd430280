//! Directory output handler
//!
//! Layout: `<directory>/<bill_id>/<pagetype>.html` holding the raw response
//! bytes, plus `<directory>/failures.tsv` listing pages that could not be
//! fetched.

use crate::bill::PageRecord;
use crate::output::traits::{OutputError, OutputHandler, OutputResult, PageFailure};
use crate::storage::RunStatus;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const FAILURES_FILE: &str = "failures.tsv";

pub struct FileOutput {
    directory: PathBuf,
    pages_written: u64,
    failures: u64,
    finalized: bool,
}

impl FileOutput {
    /// Creates the output directory if needed
    pub fn new(directory: impl Into<PathBuf>) -> OutputResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            pages_written: 0,
            failures: 0,
            finalized: false,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where the body of a page lands
    pub fn page_path(&self, bill_id: &str, pagetype: &str) -> PathBuf {
        self.directory
            .join(path_component(bill_id))
            .join(format!("{}.html", pagetype))
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        Ok(())
    }
}

/// Makes an id safe to use as a single directory name
///
/// Alphanumerics and `-` are kept; every other byte, `_` included, becomes
/// `_XX` (uppercase hex), so distinct ids never share a directory. The empty
/// id maps to a lone `_`, which no escaped id can produce.
fn path_component(id: &str) -> String {
    if id.is_empty() {
        return "_".to_string();
    }

    let mut escaped = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_alphanumeric() || c == '-' {
            escaped.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("_{:02X}", byte));
            }
        }
    }
    escaped
}

/// Tabs and newlines would break the TSV layout
fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

impl OutputHandler for FileOutput {
    fn name(&self) -> &str {
        "files"
    }

    fn record_page(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.check_open()?;
        let path = self.page_path(&record.bill_id, record.pagetype.as_str());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &record.body)?;
        self.pages_written += 1;

        tracing::trace!("Wrote {} bytes to {}", record.body.len(), path.display());
        Ok(())
    }

    fn record_failure(&mut self, failure: &PageFailure) -> OutputResult<()> {
        self.check_open()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.directory.join(FAILURES_FILE))?;

        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}",
            tsv_field(&failure.bill_id),
            failure.pagetype,
            failure.attempts,
            tsv_field(&failure.url),
            tsv_field(&failure.message)
        )?;
        self.failures += 1;
        Ok(())
    }

    fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
        self.check_open()?;
        self.finalized = true;
        tracing::info!(
            "File output in {}: {} pages written, {} failures ({})",
            self.directory.display(),
            self.pages_written,
            self.failures,
            status.to_db_string()
        );
        Ok(())
    }
}
