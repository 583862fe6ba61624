//! Pins the date-row offset: with the default layout the first scanned
//! date row (B7) resolves to sheet row 7, i.e. `header_offset = 6`.

use chrono::NaiveDate;
use std::sync::Arc;
use tallybot_core::{
    config::DEFAULT_HEADER_OFFSET, DateRowResolver, IncrementTransactor, MemoryStore, SheetLayout,
    TabularStore, Unit,
};

#[test]
fn default_header_offset_is_six() {
    assert_eq!(DEFAULT_HEADER_OFFSET, 6);
    assert_eq!(SheetLayout::default().header_offset, 6);
}

#[test]
fn first_date_row_maps_to_row_seven_and_increment_lands_there() {
    let store = Arc::new(MemoryStore::new());
    store.put("Nau A", "B", 7, "05/03/26");
    let layout = SheetLayout::default();
    let unit = Unit::new('A').unwrap();

    let resolver = DateRowResolver::new(store.clone(), layout.clone());
    let row = resolver
        .resolve(unit, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap())
        .unwrap();
    assert_eq!(row, 7);

    let transactor = IncrementTransactor::new(store.clone(), layout, true);
    let receipt = transactor.apply(unit, row, 2, false).unwrap();
    assert_eq!(receipt.cell.row, 7);
    assert_eq!(store.get("Nau A", "E", 7).as_deref(), Some("2"));
}

#[test]
fn written_value_reads_back_unformatted() {
    let store = Arc::new(MemoryStore::new());
    let transactor = IncrementTransactor::new(store.clone(), SheetLayout::default(), true);
    let receipt = transactor
        .apply(Unit::new('A').unwrap(), 7, 1500, false)
        .unwrap();
    let read_back = store.read_cell(&receipt.cell).unwrap();
    assert_eq!(read_back.as_deref(), Some("1500"));
}
