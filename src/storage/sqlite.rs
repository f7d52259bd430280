//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::bill::{PageRecord, PageType};
use crate::state::PageState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredPage};
use crate::LikmsError;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, since_date, config_hash, status";
const PAGE_COLUMNS: &str =
    "id, run_id, bill_id, pagetype, state, body, error_message, recorded_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`, creating parent directories
    pub fn new(path: &Path) -> Result<Self, LikmsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, LikmsError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn insert_page(
        &mut self,
        run_id: i64,
        bill_id: &str,
        pagetype: PageType,
        state: PageState,
        body: Option<&[u8]>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (run_id, bill_id, pagetype, state, body, error_message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(run_id, bill_id, pagetype) DO UPDATE SET
                state = excluded.state,
                body = excluded.body,
                error_message = excluded.error_message,
                recorded_at = excluded.recorded_at",
            params![
                run_id,
                bill_id,
                pagetype.as_str(),
                state.to_db_string(),
                body,
                error_message,
                now
            ],
        )?;
        Ok(())
    }
}

/// Reads a text column through a parser, failing the row on unknown values
fn parsed_column<T>(
    row: &Row<'_>,
    index: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let value: String = row.get(index)?;
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("unexpected value '{}'", value).into(),
        )
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        since_date: row.get(3)?,
        config_hash: row.get(4)?,
        status: parsed_column(row, 5, RunStatus::from_db_string)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<StoredPage> {
    Ok(StoredPage {
        id: row.get(0)?,
        run_id: row.get(1)?,
        bill_id: row.get(2)?,
        pagetype: parsed_column(row, 3, |s| s.parse().ok())?,
        state: parsed_column(row, 4, PageState::from_db_string)?,
        body: row.get(5)?,
        error_message: row.get(6)?,
        recorded_at: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, since: NaiveDate, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, since_date, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                since.format("%Y-%m-%d").to_string(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn save_page(&mut self, run_id: i64, record: &PageRecord) -> StorageResult<()> {
        self.insert_page(
            run_id,
            &record.bill_id,
            record.pagetype,
            PageState::Fetched,
            Some(&record.body),
            None,
        )
    }

    fn save_failure(
        &mut self,
        run_id: i64,
        bill_id: &str,
        pagetype: PageType,
        message: &str,
    ) -> StorageResult<()> {
        self.insert_page(
            run_id,
            bill_id,
            pagetype,
            PageState::Failed,
            None,
            Some(message),
        )
    }

    fn get_page(
        &self,
        run_id: i64,
        bill_id: &str,
        pagetype: PageType,
    ) -> StorageResult<Option<StoredPage>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE run_id = ?1 AND bill_id = ?2 AND pagetype = ?3",
                    PAGE_COLUMNS
                ),
                params![run_id, bill_id, pagetype.as_str()],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn list_failures(&self, run_id: i64) -> StorageResult<Vec<StoredPage>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE run_id = ?1 AND state = ?2 ORDER BY bill_id, pagetype",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(
                params![run_id, PageState::Failed.to_db_string()],
                page_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    // ===== Statistics =====

    fn count_pages_by_state(&self, state: PageState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_bills(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT bill_id) FROM pages", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }
}
