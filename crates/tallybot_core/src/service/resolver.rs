//! Date-row resolver: maps "today" to a row of a unit's sheet.
//!
//! # Invariants
//! - Matching is an exact string comparison against the first cell of each
//!   scanned row; no trimming, no date parsing.
//! - The result is `header_offset + 1-based position` and is never cached.

use crate::config::SheetLayout;
use crate::error::{EntryError, EntryResult};
use crate::model::entry::{RowPosition, Unit};
use crate::store::TabularStore;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

pub struct DateRowResolver {
    store: Arc<dyn TabularStore>,
    layout: SheetLayout,
}

impl DateRowResolver {
    pub fn new(store: Arc<dyn TabularStore>, layout: SheetLayout) -> Self {
        Self { store, layout }
    }

    /// Renders a date with the layout's date format (default `dd/mm/yy`).
    pub fn date_label(&self, date: NaiveDate) -> String {
        date.format(&self.layout.date_format).to_string()
    }

    /// Resolves the absolute row holding `today` in `unit`'s date column.
    ///
    /// # Errors
    /// - `DateNotFound` when no scanned row matches (including an empty range).
    /// - `StoreUnavailable` when the range read fails.
    pub fn resolve(&self, unit: Unit, today: NaiveDate) -> EntryResult<RowPosition> {
        let date = self.date_label(today);
        let sheet = self.layout.sheet_name(unit);
        let rows = self.store.read_range(
            &sheet,
            &self.layout.date_column,
            self.layout.first_date_row(),
            self.layout.last_date_row(),
        )?;

        let position = rows
            .iter()
            .position(|row| row.first().map(String::as_str) == Some(date.as_str()));

        match position {
            Some(index) => {
                let row = self.layout.row_for_position(index as u32 + 1);
                info!("event=date_resolve module=resolver status=ok unit={unit} date={date} row={row}");
                Ok(row)
            }
            None => {
                warn!(
                    "event=date_resolve module=resolver status=not_found unit={unit} date={date} scanned_rows={}",
                    rows.len()
                );
                Err(EntryError::DateNotFound { date })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DateRowResolver;
    use crate::config::SheetLayout;
    use crate::error::EntryError;
    use crate::model::entry::Unit;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn first_scanned_row_resolves_to_header_offset_plus_one() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "B", 7, "18/10/26");
        let resolver = DateRowResolver::new(store, SheetLayout::default());
        assert_eq!(resolver.resolve(Unit::new('A').unwrap(), date(18)).unwrap(), 7);
    }

    #[test]
    fn later_rows_keep_their_sheet_position() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "B", 7, "17/10/26");
        store.put("Nau A", "B", 9, "18/10/26");
        let resolver = DateRowResolver::new(store, SheetLayout::default());
        assert_eq!(resolver.resolve(Unit::new('a').unwrap(), date(18)).unwrap(), 9);
    }

    #[test]
    fn custom_offset_shifts_the_row() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "B", 3, "18/10/26");
        let layout = SheetLayout {
            header_offset: 1,
            ..SheetLayout::default()
        };
        let resolver = DateRowResolver::new(store, layout);
        assert_eq!(resolver.resolve(Unit::new('A').unwrap(), date(18)).unwrap(), 3);
    }

    #[test]
    fn dates_outside_the_scanned_range_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "B", 6, "18/10/26");
        store.put("Nau A", "B", 102, "18/10/26");
        let resolver = DateRowResolver::new(store, SheetLayout::default());
        let err = resolver.resolve(Unit::new('A').unwrap(), date(18)).unwrap_err();
        assert!(matches!(err, EntryError::DateNotFound { ref date } if date == "18/10/26"));
    }

    #[test]
    fn match_is_exact() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "B", 7, "18/10/2026");
        store.put("Nau A", "B", 8, " 18/10/26");
        let resolver = DateRowResolver::new(store, SheetLayout::default());
        assert!(resolver.resolve(Unit::new('A').unwrap(), date(18)).is_err());
    }
}
