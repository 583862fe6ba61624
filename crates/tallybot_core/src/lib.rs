//! Core domain logic for the tally bot.
//! Turns authorized chat messages into validated increments of a
//! date-indexed tabular store.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod transport;

pub use auth::Authorizer;
pub use clock::{Clock, FixedClock, LocalClock};
pub use config::{AppConfig, ConfigError, LoggingConfig, SheetLayout, ValidUnitSet};
pub use error::{EntryError, EntryResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::entry::{CellRef, IncrementReceipt, ParsedEntry, RowPosition, Unit};
pub use model::message::{ChatId, RawMessage, UserId};
pub use pipeline::{classify, normalize, ClassifyError, NormalizedText, UnitValidator};
pub use service::dispatch::{DispatchError, Dispatcher, JobHandle};
pub use service::handler::{
    MessageHandler, Outcome, Reply, ReplyKind, DAILY_REPORT_COMMAND, TOTALS_REPORT_COMMAND,
};
pub use service::report::{DailyReport, DailyStatus, ReportService, TotalsReport, UnitTotals};
pub use service::resolver::DateRowResolver;
pub use service::transactor::{parse_stored_count, CellLocks, IncrementTransactor};
pub use store::{MemoryStore, SqliteStore, StoreError, StoreResult, TabularStore};
pub use transport::{MemoryTransport, Transport, TransportError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
