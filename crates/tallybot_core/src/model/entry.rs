//! Parsed entries, sheet addresses and increment receipts.

use std::fmt::{Display, Formatter};

/// Single-letter identifier of a tracked unit, always upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit(char);

impl Unit {
    /// Builds a unit from any alphabetic char, folding it to upper-case.
    ///
    /// Returns `None` for non-alphabetic input or letters whose upper-case
    /// form is not a single char.
    pub fn new(letter: char) -> Option<Self> {
        if !letter.is_alphabetic() {
            return None;
        }
        let mut upper = letter.to_uppercase();
        let folded = upper.next()?;
        if upper.next().is_some() {
            return None;
        }
        Some(Self(folded))
    }

    /// Parses a one-letter string such as `"a"` or `"B"`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut chars = value.trim().chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Self::new(letter)
    }

    pub fn letter(self) -> char {
        self.0
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated `(unit, quantity, flag)` triple produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedEntry {
    pub unit: Unit,
    /// Always `>= 1`.
    pub quantity: u32,
    /// `true` when the flag token was present; selects the flag column.
    pub flag: bool,
}

/// Absolute row index inside one unit's sheet.
///
/// Only meaningful for the unit and date that produced it; never cached.
pub type RowPosition = u32;

/// Cell address inside one named sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub sheet: String,
    pub column: String,
    pub row: u32,
}

impl CellRef {
    pub fn new(sheet: impl Into<String>, column: impl Into<String>, row: u32) -> Self {
        Self {
            sheet: sheet.into(),
            column: column.into(),
            row,
        }
    }
}

impl Display for CellRef {
    /// A1 notation with a quoted sheet name, e.g. `'Nau A'!D12`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'!{}{}", self.sheet, self.column, self.row)
    }
}

/// Result of one successful read-increment-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementReceipt {
    pub unit: Unit,
    pub cell: CellRef,
    pub quantity: u32,
    pub flag: bool,
    pub old_value: i64,
    pub new_value: i64,
}
