//! Grammar classifier for the "count + unit letter [+ flag]" shape.

use crate::model::entry::{ParsedEntry, Unit};
use crate::pipeline::normalize::NormalizedText;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zñç0-9 ]*$").expect("valid allowed-chars regex"));
static LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zñç]").expect("valid letter regex"));
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").expect("valid digit regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyError {
    /// Something other than letters, digits or spaces is present.
    InvalidCharacters,
    /// Letter count is not exactly one.
    WrongShape,
    /// Digits are missing, zero, or out of range.
    InvalidQuantity,
}

impl Display for ClassifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCharacters => write!(f, "message contains non-alphanumeric characters"),
            Self::WrongShape => write!(f, "expected a quantity and a single unit letter"),
            Self::InvalidQuantity => write!(f, "quantity must be an integer >= 1"),
        }
    }
}

impl Error for ClassifyError {}

/// Extracts `(unit, quantity, flag)` from normalized text.
///
/// # Contract
/// - Accepts `<letter><digits>`, `<digits><letter>` and spaced variants
///   (`"a 5"`); digits need not be contiguous and are concatenated.
/// - The unit letter is upper-cased on output.
pub fn classify(input: &NormalizedText) -> Result<ParsedEntry, ClassifyError> {
    let text = input.text.as_str();
    if !ALLOWED_RE.is_match(text) {
        return Err(ClassifyError::InvalidCharacters);
    }

    let letters: Vec<&str> = LETTER_RE.find_iter(text).map(|m| m.as_str()).collect();
    if letters.len() != 1 {
        return Err(ClassifyError::WrongShape);
    }

    let digits: String = DIGIT_RE.find_iter(text).map(|m| m.as_str()).collect();
    if digits.is_empty() {
        return Err(ClassifyError::InvalidQuantity);
    }
    let quantity = digits
        .parse::<u32>()
        .map_err(|_| ClassifyError::InvalidQuantity)?;
    if quantity < 1 {
        return Err(ClassifyError::InvalidQuantity);
    }

    let unit = letters[0]
        .chars()
        .next()
        .and_then(Unit::new)
        .ok_or(ClassifyError::WrongShape)?;

    Ok(ParsedEntry {
        unit,
        quantity,
        flag: input.flag,
    })
}
