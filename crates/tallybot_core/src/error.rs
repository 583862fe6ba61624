//! Terminal failure kinds of one increment attempt.
//!
//! Every variant is recoverable at the message boundary: it is logged,
//! formatted into exactly one reply, and the pipeline stops for that message.

use crate::model::entry::{CellRef, Unit};
use crate::pipeline::classify::ClassifyError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EntryResult<T> = Result<T, EntryError>;

#[derive(Debug)]
pub enum EntryError {
    InvalidCharacters,
    WrongShape,
    InvalidQuantity,
    UnknownUnit {
        unit: Unit,
        /// Sorted accepted units, for the user-facing hint.
        valid: Vec<Unit>,
    },
    DateNotFound {
        date: String,
    },
    NonNumericCell {
        cell: CellRef,
        raw: String,
    },
    StoreUnavailable(StoreError),
}

impl EntryError {
    /// Stable snake_case code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCharacters => "invalid_characters",
            Self::WrongShape => "wrong_shape",
            Self::InvalidQuantity => "invalid_quantity",
            Self::UnknownUnit { .. } => "unknown_unit",
            Self::DateNotFound { .. } => "date_not_found",
            Self::NonNumericCell { .. } => "non_numeric_cell",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCharacters => write!(f, "{}", ClassifyError::InvalidCharacters),
            Self::WrongShape => write!(f, "{}", ClassifyError::WrongShape),
            Self::InvalidQuantity => write!(f, "{}", ClassifyError::InvalidQuantity),
            Self::UnknownUnit { unit, .. } => write!(f, "unknown unit `{unit}`"),
            Self::DateNotFound { date } => write!(f, "date `{date}` not found in date column"),
            Self::NonNumericCell { cell, raw } => {
                write!(f, "cell {cell} holds non-numeric value `{raw}`")
            }
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for EntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClassifyError> for EntryError {
    fn from(value: ClassifyError) -> Self {
        match value {
            ClassifyError::InvalidCharacters => Self::InvalidCharacters,
            ClassifyError::WrongShape => Self::WrongShape,
            ClassifyError::InvalidQuantity => Self::InvalidQuantity,
        }
    }
}

impl From<StoreError> for EntryError {
    fn from(value: StoreError) -> Self {
        Self::StoreUnavailable(value)
    }
}
