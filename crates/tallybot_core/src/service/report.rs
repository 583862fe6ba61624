//! Daily and total tally summaries.
//!
//! Read-only: reports never write to the store.

use crate::config::{SheetLayout, ValidUnitSet};
use crate::error::{EntryError, EntryResult};
use crate::model::entry::Unit;
use crate::service::resolver::DateRowResolver;
use crate::service::transactor::parse_stored_count;
use crate::store::TabularStore;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyStatus {
    /// `None` marks a cell whose content is not numeric.
    Found {
        plain: Option<i64>,
        flag: Option<i64>,
    },
    DateNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDaily {
    pub unit: Unit,
    pub status: DailyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    pub date: String,
    pub units: Vec<UnitDaily>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTotals {
    pub unit: Unit,
    pub plain: i64,
    pub flag: i64,
    /// Non-numeric cells left out of the sums.
    pub skipped_cells: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsReport {
    pub units: Vec<UnitTotals>,
}

pub struct ReportService {
    store: Arc<dyn TabularStore>,
    layout: SheetLayout,
    units: ValidUnitSet,
    resolver: DateRowResolver,
}

impl ReportService {
    pub fn new(store: Arc<dyn TabularStore>, layout: SheetLayout, units: ValidUnitSet) -> Self {
        let resolver = DateRowResolver::new(store.clone(), layout.clone());
        Self {
            store,
            layout,
            units,
            resolver,
        }
    }

    /// Reads today's flag and plain cells for every valid unit.
    ///
    /// A unit without today's date is reported, not treated as a failure.
    pub fn daily(&self, today: NaiveDate) -> EntryResult<DailyReport> {
        let mut units = Vec::with_capacity(self.units.len());
        for unit in self.units.iter() {
            let status = match self.resolver.resolve(unit, today) {
                Ok(row) => DailyStatus::Found {
                    plain: self.read_count(unit, false, row)?,
                    flag: self.read_count(unit, true, row)?,
                },
                Err(EntryError::DateNotFound { .. }) => DailyStatus::DateNotFound,
                Err(other) => return Err(other),
            };
            units.push(UnitDaily { unit, status });
        }
        info!("event=report_daily module=report status=ok units={}", units.len());
        Ok(DailyReport {
            date: self.resolver.date_label(today),
            units,
        })
    }

    /// Sums both tally columns over the whole date range of every unit.
    pub fn totals(&self) -> EntryResult<TotalsReport> {
        let mut units = Vec::with_capacity(self.units.len());
        for unit in self.units.iter() {
            let (plain, plain_skipped) = self.sum_column(unit, false)?;
            let (flag, flag_skipped) = self.sum_column(unit, true)?;
            let skipped_cells = plain_skipped + flag_skipped;
            if skipped_cells > 0 {
                warn!(
                    "event=report_totals module=report status=partial unit={unit} skipped_cells={skipped_cells}"
                );
            }
            units.push(UnitTotals {
                unit,
                plain,
                flag,
                skipped_cells,
            });
        }
        info!("event=report_totals module=report status=ok units={}", units.len());
        Ok(TotalsReport { units })
    }

    fn read_count(&self, unit: Unit, flag: bool, row: u32) -> EntryResult<Option<i64>> {
        let cell = self.layout.cell(unit, flag, row);
        let raw = self.store.read_cell(&cell)?;
        Ok(match raw {
            None => Some(0),
            Some(text) => parse_stored_count(&text),
        })
    }

    fn sum_column(&self, unit: Unit, flag: bool) -> EntryResult<(i64, usize)> {
        let rows = self.store.read_range(
            &self.layout.sheet_name(unit),
            self.layout.column_for(flag),
            self.layout.first_date_row(),
            self.layout.last_date_row(),
        )?;
        let mut sum: i64 = 0;
        let mut skipped = 0;
        for value in rows.iter().filter_map(|row| row.first()) {
            match parse_stored_count(value) {
                Some(count) => sum = sum.saturating_add(count),
                None => skipped += 1,
            }
        }
        Ok((sum, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::{DailyStatus, ReportService};
    use crate::config::{SheetLayout, ValidUnitSet};
    use crate::error::EntryError;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn service(store: Arc<MemoryStore>) -> ReportService {
        ReportService::new(
            store,
            SheetLayout::default(),
            ValidUnitSet::from_names(&["A", "B"]).unwrap(),
        )
    }

    #[test]
    fn daily_reads_both_columns_and_flags_missing_dates() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "B", 8, "18/10/26");
        store.put("Nau A", "D", 8, "2");
        store.put("Nau A", "E", 8, "n/a");

        let report = service(store).daily(today()).unwrap();
        assert_eq!(report.date, "18/10/26");
        assert_eq!(
            report.units[0].status,
            DailyStatus::Found {
                plain: None,
                flag: Some(2)
            }
        );
        assert_eq!(report.units[1].status, DailyStatus::DateNotFound);
    }

    #[test]
    fn totals_sum_numeric_cells_and_count_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.put("Nau A", "E", 7, "3");
        store.put("Nau A", "E", 9, "4");
        store.put("Nau A", "E", 10, "x");
        store.put("Nau A", "D", 7, "1.5");
        store.put("Nau A", "E", 102, "100");

        let report = service(store).totals().unwrap();
        let unit_a = &report.units[0];
        assert_eq!(unit_a.plain, 7);
        assert_eq!(unit_a.flag, 1);
        assert_eq!(unit_a.skipped_cells, 1);
        assert_eq!(report.units[1].plain, 0);
    }

    #[test]
    fn store_failure_aborts_reports() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let service = service(store);
        assert!(matches!(
            service.daily(today()),
            Err(EntryError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.totals(),
            Err(EntryError::StoreUnavailable(_))
        ));
    }
}
