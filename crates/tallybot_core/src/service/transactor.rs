//! Increment transactor: read, validate, add, write one tally cell.
//!
//! # Invariants
//! - Stored result equals `previous + quantity`; empty cells count as 0.
//! - Non-numeric content aborts before any write.
//! - With `CellLocks` enabled, the read-to-write window of one cell is
//!   serialized inside this process. Other writers of the same store are
//!   not covered.

use crate::config::SheetLayout;
use crate::error::{EntryError, EntryResult};
use crate::model::entry::{CellRef, IncrementReceipt, RowPosition, Unit};
use crate::store::TabularStore;
use dashmap::DashMap;
use log::{info, warn};
use std::sync::{Arc, Mutex, PoisonError};

/// Per-cell mutual exclusion held across one read-modify-write.
#[derive(Debug, Default)]
pub struct CellLocks {
    locks: DashMap<CellRef, Arc<Mutex<()>>>,
}

impl CellLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, cell: &CellRef) -> Arc<Mutex<()>> {
        self.locks.entry(cell.clone()).or_default().clone()
    }

    /// Number of distinct cells that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct IncrementTransactor {
    store: Arc<dyn TabularStore>,
    layout: SheetLayout,
    locks: Option<CellLocks>,
}

impl IncrementTransactor {
    /// `serialize = false` keeps the unguarded check-then-act sequence.
    pub fn new(store: Arc<dyn TabularStore>, layout: SheetLayout, serialize: bool) -> Self {
        Self {
            store,
            layout,
            locks: serialize.then(CellLocks::new),
        }
    }

    pub fn is_serialized(&self) -> bool {
        self.locks.is_some()
    }

    /// Adds `quantity` to the flag/plain cell of `row` and reports old/new.
    ///
    /// # Errors
    /// - `NonNumericCell` when the current value is not a finite decimal, or
    ///   the sum overflows. Nothing is written.
    /// - `StoreUnavailable` when the read or the write fails. No retry.
    pub fn apply(
        &self,
        unit: Unit,
        row: RowPosition,
        quantity: u32,
        flag: bool,
    ) -> EntryResult<IncrementReceipt> {
        let cell = self.layout.cell(unit, flag, row);
        match &self.locks {
            Some(locks) => {
                let handle = locks.handle(&cell);
                let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
                self.read_modify_write(unit, cell, quantity, flag)
            }
            None => self.read_modify_write(unit, cell, quantity, flag),
        }
    }

    fn read_modify_write(
        &self,
        unit: Unit,
        cell: CellRef,
        quantity: u32,
        flag: bool,
    ) -> EntryResult<IncrementReceipt> {
        let raw = self.store.read_cell(&cell)?;
        let old_value = match raw.as_deref() {
            None => 0,
            Some(text) => match parse_stored_count(text) {
                Some(value) => value,
                None => {
                    warn!("event=increment module=transactor status=rejected reason=non_numeric cell={cell}");
                    return Err(EntryError::NonNumericCell {
                        cell,
                        raw: text.to_string(),
                    });
                }
            },
        };

        let Some(new_value) = old_value.checked_add(i64::from(quantity)) else {
            warn!("event=increment module=transactor status=rejected reason=overflow cell={cell}");
            return Err(EntryError::NonNumericCell {
                cell,
                raw: raw.unwrap_or_default(),
            });
        };

        self.store.write_cell(&cell, &new_value.to_string())?;
        info!(
            "event=increment module=transactor status=ok cell={cell} old={old_value} quantity={quantity} new={new_value}"
        );

        Ok(IncrementReceipt {
            unit,
            cell,
            quantity,
            flag,
            old_value,
            new_value,
        })
    }
}

/// Parses a raw stored value into the integer tally domain.
///
/// Blank text is 0. Decimals are floored (`2.9 -> 2`, `-0.5 -> -1`).
/// Returns `None` for non-numeric, non-finite or out-of-range values.
pub fn parse_stored_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    if floored < i64::MIN as f64 || floored >= i64::MAX as f64 {
        return None;
    }
    Some(floored as i64)
}
