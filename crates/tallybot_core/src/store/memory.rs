//! In-memory `TabularStore` with call counters and failure switches.

use super::{check_cell, check_range, non_blank, StoreError, StoreResult, TabularStore};
use crate::model::entry::CellRef;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type CellKey = (String, String, u32);

/// Thread-safe map-backed store.
#[derive(Default)]
pub struct MemoryStore {
    cells: Mutex<BTreeMap<CellKey, String>>,
    unavailable: AtomicBool,
    writes_rejected: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `latency` after each cell read, widening the
    /// read-to-write window of callers.
    pub fn with_read_latency(latency: Duration) -> Self {
        Self {
            read_latency: Some(latency),
            ..Self::default()
        }
    }

    /// Seeds one cell without touching the counters.
    pub fn put(&self, sheet: &str, column: &str, row: u32, value: impl Into<String>) {
        self.lock()
            .insert((sheet.to_string(), column.to_string(), row), value.into());
    }

    /// Reads one cell without touching the counters.
    pub fn get(&self, sheet: &str, column: &str, row: u32) -> Option<String> {
        self.lock()
            .get(&(sheet.to_string(), column.to_string(), row))
            .cloned()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes every subsequent write fail while reads keep working.
    pub fn set_writes_rejected(&self, rejected: bool) {
        self.writes_rejected.store(rejected, Ordering::SeqCst);
    }

    /// Number of `read_range` + `read_cell` calls served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<CellKey, String>> {
        // A poisoned map still holds consistent cell values.
        self.cells
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

impl TabularStore for MemoryStore {
    fn read_range(
        &self,
        sheet: &str,
        column: &str,
        first_row: u32,
        last_row: u32,
    ) -> StoreResult<Vec<Vec<String>>> {
        self.check_available()?;
        check_range(first_row, last_row)?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let cells = self.lock();
        let mut rows: Vec<Vec<String>> = (first_row..=last_row)
            .map(|row| {
                non_blank(cells.get(&(sheet.to_string(), column.to_string(), row)).cloned())
                    .into_iter()
                    .collect()
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    fn read_cell(&self, cell: &CellRef) -> StoreResult<Option<String>> {
        self.check_available()?;
        check_cell(cell)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value = non_blank(self.get(&cell.sheet, &cell.column, cell.row));
        if let Some(latency) = self.read_latency {
            std::thread::sleep(latency);
        }
        Ok(value)
    }

    fn write_cell(&self, cell: &CellRef, value: &str) -> StoreResult<()> {
        self.check_available()?;
        check_cell(cell)?;
        if self.writes_rejected.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected(cell.to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put(&cell.sheet, &cell.column, cell.row, value);
        Ok(())
    }
}
