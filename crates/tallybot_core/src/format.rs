//! User-facing reply texts (Catalan).
//!
//! Pure functions: every terminal outcome maps to one fixed template.
//! Sending is the transport's job.

use crate::error::EntryError;
use crate::model::entry::{IncrementReceipt, Unit};
use crate::service::report::{DailyReport, DailyStatus, TotalsReport};

pub const NON_TEXT_MESSAGE: &str = "Només s'admeten missatges de text.";
pub const INVALID_CHARACTERS_MESSAGE: &str =
    "El format no és correcte. Només està permès utilitzar caràcters alfanumèrics.";
pub const WRONG_SHAPE_MESSAGE: &str = "El format no és correcte. El format correcte està compost pel nombre de baixes, la lletra de la nau i, si és un sacrificat, ha de contenir 'sac'.";
pub const INVALID_QUANTITY_MESSAGE: &str = "El nombre de baixes ha de ser igual o superior a 1 i el format ha de ser correcte (ex: 'A10' o '10A').";
pub const INTERNAL_ERROR_MESSAGE: &str =
    "S'ha produït un error inesperat i no s'ha pogut processar el missatge.";
pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "Hi ha hagut un error amb la comunicació del full de dades.";

pub fn format_receipt(receipt: &IncrementReceipt) -> String {
    format!(
        "S'ha escrit de forma satisfactòria, l'antic valor era {} i el nou valor és {}",
        receipt.old_value, receipt.new_value
    )
}

pub fn format_error(error: &EntryError) -> String {
    match error {
        EntryError::InvalidCharacters => INVALID_CHARACTERS_MESSAGE.to_string(),
        EntryError::WrongShape => WRONG_SHAPE_MESSAGE.to_string(),
        EntryError::InvalidQuantity => INVALID_QUANTITY_MESSAGE.to_string(),
        EntryError::UnknownUnit { unit, valid } => format!(
            "La nau {unit} no està dins del rang de naus vàlides ({}).",
            join_units(valid)
        ),
        EntryError::DateNotFound { date } => {
            format!("La data actual '{date}' no s'ha trobat dins de la fulla de càlcul.")
        }
        EntryError::NonNumericCell { cell, .. } => format!(
            "Error: la cel·la '{cell}' de la fulla de càlcul conté un valor no numèric. No es pot sumar."
        ),
        EntryError::StoreUnavailable(_) => STORE_UNAVAILABLE_MESSAGE.to_string(),
    }
}

pub fn format_outcome(result: &Result<IncrementReceipt, EntryError>) -> String {
    match result {
        Ok(receipt) => format_receipt(receipt),
        Err(error) => format_error(error),
    }
}

pub fn format_daily(report: &DailyReport) -> String {
    let mut lines = vec![format!("Baixes d'avui ({}):", report.date)];
    for entry in &report.units {
        let line = match &entry.status {
            DailyStatus::Found { plain, flag } => format!(
                "Nau {}: {} baixes, {} sacrificades",
                entry.unit,
                count_or_dash(*plain),
                count_or_dash(*flag)
            ),
            DailyStatus::DateNotFound => format!("Nau {}: data no trobada", entry.unit),
        };
        lines.push(line);
    }
    lines.join("\n")
}

pub fn format_totals(report: &TotalsReport) -> String {
    let mut lines = vec!["Baixes totals:".to_string()];
    for entry in &report.units {
        lines.push(format!(
            "Nau {}: {} baixes, {} sacrificades",
            entry.unit, entry.plain, entry.flag
        ));
    }
    lines.join("\n")
}

fn join_units(units: &[Unit]) -> String {
    units
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn count_or_dash(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |count| count.to_string())
}
