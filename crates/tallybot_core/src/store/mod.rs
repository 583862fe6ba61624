//! Tabular store contracts and implementations.
//!
//! # Responsibility
//! - Define the cell-addressable read/write contract the core relies on.
//! - Keep backend details (SQLite, in-memory) behind `TabularStore`.
//!
//! # Invariants
//! - Values are exchanged raw: no locale or number formatting on read,
//!   no formula interpretation on write.
//! - A missing cell and a blank cell both read as `None`.

pub mod memory;
pub mod schema;
pub mod sqlite;

use crate::model::entry::CellRef;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Backend unreachable or access denied.
    Unavailable(String),
    /// Write path switched off while reads still succeed.
    WriteRejected(String),
    Sqlite(rusqlite::Error),
    /// The store file was written by a newer build.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    InvalidAddress(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "store unavailable: {details}"),
            Self::WriteRejected(details) => write!(f, "store rejected write: {details}"),
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "sheet store schema version {found} is newer than supported {supported}"
            ),
            Self::InvalidAddress(details) => write!(f, "invalid cell address: {details}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Cell-addressable external store.
pub trait TabularStore: Send + Sync {
    /// Reads `column` over `first_row..=last_row` of `sheet`.
    ///
    /// Returns one entry per row in order; an empty row is an empty vec.
    /// Trailing empty rows may be omitted.
    fn read_range(
        &self,
        sheet: &str,
        column: &str,
        first_row: u32,
        last_row: u32,
    ) -> StoreResult<Vec<Vec<String>>>;

    /// Reads one raw cell value; `None` when empty.
    fn read_cell(&self, cell: &CellRef) -> StoreResult<Option<String>>;

    /// Writes one raw value.
    fn write_cell(&self, cell: &CellRef, value: &str) -> StoreResult<()>;
}

fn check_range(first_row: u32, last_row: u32) -> StoreResult<()> {
    if first_row == 0 || last_row < first_row {
        return Err(StoreError::InvalidAddress(format!(
            "row range {first_row}..={last_row}"
        )));
    }
    Ok(())
}

fn check_cell(cell: &CellRef) -> StoreResult<()> {
    if cell.row == 0 || cell.column.is_empty() || cell.sheet.is_empty() {
        return Err(StoreError::InvalidAddress(cell.to_string()));
    }
    Ok(())
}

/// Normalizes a raw stored value: blank strings read as empty.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
