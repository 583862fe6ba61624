//! SQLite-backed `TabularStore`.
//!
//! # Responsibility
//! - Persist raw cell values keyed by `(sheet, col, row)`.
//! - Prepare per-unit date columns so that today's row can be resolved.
//!
//! # Invariants
//! - Values are stored as text exactly as written.
//! - One connection is shared behind a mutex; each call is a single statement.

use super::schema;
use super::{check_cell, check_range, non_blank, StoreError, StoreResult, TabularStore};
use crate::config::SheetLayout;
use crate::model::entry::{CellRef, Unit};
use chrono::{Days, NaiveDate};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens a store file, upgrading its schema when needed.
    ///
    /// # Errors
    /// - `UnsupportedSchemaVersion` for files written by a newer build.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        Self::open_with(&path.display().to_string(), || Connection::open(path))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with(":memory:", Connection::open_in_memory)
    }

    fn open_with(
        location: &str,
        open: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        let result = open().map_err(StoreError::from).and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            let steps = schema::upgrade(&mut conn)?;
            Ok((conn, steps))
        });
        match result {
            Ok((conn, steps)) => {
                info!(
                    "event=store_open module=store status=ok location={location} schema_steps={steps} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self::new(conn))
            }
            Err(err) => {
                error!(
                    "event=store_open module=store status=error location={location} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Schema version recorded in the open file.
    pub fn schema_version(&self) -> StoreResult<u32> {
        schema::current_version(&*self.conn()?)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
    }

    /// Fills the date column of each unit's sheet with `days` consecutive
    /// dates starting at `start`, from the first date row on.
    ///
    /// Existing date cells in that window are overwritten; tally cells are
    /// left untouched. Returns the number of date cells written.
    pub fn prepare_dates(
        &self,
        layout: &SheetLayout,
        units: impl IntoIterator<Item = Unit>,
        start: NaiveDate,
        days: u32,
    ) -> StoreResult<usize> {
        let days = days.min(layout.date_row_count);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        for unit in units {
            let sheet = layout.sheet_name(unit);
            for offset in 0..days {
                let date = start
                    .checked_add_days(Days::new(u64::from(offset)))
                    .ok_or_else(|| {
                        StoreError::InvalidAddress(format!("date overflow after {start}"))
                    })?;
                let row = layout.first_date_row() + offset;
                upsert(
                    &tx,
                    &sheet,
                    &layout.date_column,
                    row,
                    &date.format(&layout.date_format).to_string(),
                )?;
                written += 1;
            }
        }
        tx.commit()?;
        info!("event=store_prepare_dates module=store status=ok cells={written} start={start}");
        Ok(written)
    }

    /// Returns all non-empty cells of one sheet row keyed by column.
    pub fn row_cells(&self, sheet: &str, row: u32) -> StoreResult<BTreeMap<String, String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT col, value FROM cells WHERE sheet = ?1 AND row = ?2 ORDER BY col;")?;
        let mut rows = stmt.query(params![sheet, row])?;
        let mut cells = BTreeMap::new();
        while let Some(record) = rows.next()? {
            cells.insert(record.get::<_, String>(0)?, record.get::<_, String>(1)?);
        }
        Ok(cells)
    }
}

impl TabularStore for SqliteStore {
    fn read_range(
        &self,
        sheet: &str,
        column: &str,
        first_row: u32,
        last_row: u32,
    ) -> StoreResult<Vec<Vec<String>>> {
        check_range(first_row, last_row)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT row, value FROM cells
             WHERE sheet = ?1 AND col = ?2 AND row BETWEEN ?3 AND ?4
             ORDER BY row;",
        )?;
        let mut rows = stmt.query(params![sheet, column, first_row, last_row])?;

        let mut values: Vec<Vec<String>> = Vec::new();
        while let Some(record) = rows.next()? {
            let row: u32 = record.get(0)?;
            let value: String = record.get(1)?;
            let index = (row - first_row) as usize;
            if values.len() <= index {
                values.resize_with(index + 1, Vec::new);
            }
            if let Some(value) = non_blank(Some(value)) {
                values[index] = vec![value];
            }
        }
        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    fn read_cell(&self, cell: &CellRef) -> StoreResult<Option<String>> {
        check_cell(cell)?;
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM cells WHERE sheet = ?1 AND col = ?2 AND row = ?3;",
                params![cell.sheet, cell.column, cell.row],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(non_blank(value))
    }

    fn write_cell(&self, cell: &CellRef, value: &str) -> StoreResult<()> {
        check_cell(cell)?;
        let conn = self.conn()?;
        upsert(&conn, &cell.sheet, &cell.column, cell.row, value)
    }
}

fn upsert(conn: &Connection, sheet: &str, column: &str, row: u32, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO cells (sheet, col, row, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (sheet, col, row) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![sheet, column, row, value],
    )?;
    Ok(())
}
