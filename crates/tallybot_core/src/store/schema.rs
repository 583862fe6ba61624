//! Versioned layout of the `cells` table.
//!
//! # Invariants
//! - The applied step is recorded in `PRAGMA user_version`.
//! - A file written by a newer build is refused, never downgraded.
//! - All pending steps commit together or not at all.

use super::{StoreError, StoreResult};
use log::info;
use rusqlite::Connection;

/// `(user_version, sql)` in ascending order.
const SCHEMA_STEPS: &[(u32, &str)] = &[
    (1, include_str!("schema/0001_cells.sql")),
    // `row_cells` filters on sheet and row without a column.
    (2, include_str!("schema/0002_row_lookup.sql")),
];

/// Newest schema version this build can read and write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings the sheet store up to `latest_version` and returns the number of
/// steps applied.
pub fn upgrade(conn: &mut Connection) -> StoreResult<usize> {
    let found = current_version(conn)?;
    let latest = latest_version();
    if found > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            found,
            supported: latest,
        });
    }

    let pending: Vec<_> = SCHEMA_STEPS
        .iter()
        .filter(|(version, _)| *version > found)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for &&(version, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!(
        "event=schema_upgrade module=store status=ok from={found} to={latest} steps={}",
        pending.len()
    );
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::{current_version, latest_version, upgrade};
    use rusqlite::Connection;

    #[test]
    fn upgrade_is_applied_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(upgrade(&mut conn).unwrap(), 2);
        assert_eq!(upgrade(&mut conn).unwrap(), 0);
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn partial_schema_only_gets_missing_steps() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("schema/0001_cells.sql"))
            .unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        assert_eq!(upgrade(&mut conn).unwrap(), 1);
        let indexed: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'cells_sheet_row';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexed, 1);
    }
}
