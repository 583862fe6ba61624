//! Static configuration loaded once at startup.
//!
//! # Responsibility
//! - Parse the JSON config file into an immutable `AppConfig`.
//! - Validate sheet layout, unit list and runtime knobs before any message
//!   is processed.
//!
//! # Invariants
//! - `AppConfig` is never mutated after `validate()` succeeds.
//! - `ValidUnitSet` members are upper-case single letters.
//! - The first scanned date row is always `header_offset + 1`.

use crate::model::entry::{CellRef, Unit};
use crate::model::message::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};
use std::path::{Path, PathBuf};

/// Placeholder substituted by the unit letter in `SheetLayout::name_template`.
pub const UNIT_PLACEHOLDER: &str = "{unit}";

/// Rows above the first date row. Row `header_offset + 1` holds the first date.
pub const DEFAULT_HEADER_OFFSET: u32 = 6;
/// Number of date rows scanned (default range is `B7:B101`).
pub const DEFAULT_DATE_ROW_COUNT: u32 = 95;
const DEFAULT_WORKERS: usize = 4;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    EmptyUnitList,
    InvalidUnit(String),
    InvalidColumn { field: &'static str, value: String },
    InvalidTemplate(String),
    InvalidLayout(String),
    InvalidWorkers(usize),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::EmptyUnitList => write!(f, "valid_units cannot be empty"),
            Self::InvalidUnit(value) => {
                write!(f, "invalid unit `{value}`; expected a single letter")
            }
            Self::InvalidColumn { field, value } => {
                write!(f, "invalid column `{value}` for `{field}`; expected letters A-Z")
            }
            Self::InvalidTemplate(value) => write!(
                f,
                "sheet name template `{value}` must contain `{UNIT_PLACEHOLDER}`"
            ),
            Self::InvalidLayout(details) => write!(f, "invalid sheet layout: {details}"),
            Self::InvalidWorkers(value) => write!(f, "workers must be > 0, got {value}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Position of the per-unit columns inside each sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Sheet name per unit, e.g. `"Nau {unit}"`.
    pub name_template: String,
    /// Column holding one pre-filled date per row.
    pub date_column: String,
    pub header_offset: u32,
    pub date_row_count: u32,
    /// Accumulation column used when the flag token is present.
    pub flag_column: String,
    /// Accumulation column used otherwise.
    pub plain_column: String,
    /// chrono format string used to render "today".
    pub date_format: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            name_template: format!("Nau {UNIT_PLACEHOLDER}"),
            date_column: "B".to_string(),
            header_offset: DEFAULT_HEADER_OFFSET,
            date_row_count: DEFAULT_DATE_ROW_COUNT,
            flag_column: "D".to_string(),
            plain_column: "E".to_string(),
            date_format: "%d/%m/%y".to_string(),
        }
    }
}

impl SheetLayout {
    pub fn sheet_name(&self, unit: Unit) -> String {
        self.name_template
            .replace(UNIT_PLACEHOLDER, &unit.letter().to_string())
    }

    pub fn first_date_row(&self) -> u32 {
        self.header_offset + 1
    }

    pub fn last_date_row(&self) -> u32 {
        self.header_offset + self.date_row_count
    }

    /// Translates a 1-based position inside the scanned range to a sheet row.
    pub fn row_for_position(&self, position: u32) -> u32 {
        self.header_offset + position
    }

    /// Two-way static mapping from the entry flag to its column.
    pub fn column_for(&self, flag: bool) -> &str {
        if flag {
            &self.flag_column
        } else {
            &self.plain_column
        }
    }

    pub fn cell(&self, unit: Unit, flag: bool, row: u32) -> CellRef {
        CellRef::new(self.sheet_name(unit), self.column_for(flag), row)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.name_template.contains(UNIT_PLACEHOLDER) {
            return Err(ConfigError::InvalidTemplate(self.name_template.clone()));
        }
        for (field, value) in [
            ("date_column", &self.date_column),
            ("flag_column", &self.flag_column),
            ("plain_column", &self.plain_column),
        ] {
            if !is_column_name(value) {
                return Err(ConfigError::InvalidColumn {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.flag_column == self.plain_column {
            return Err(ConfigError::InvalidLayout(
                "flag_column and plain_column must differ".to_string(),
            ));
        }
        if self.date_row_count == 0 {
            return Err(ConfigError::InvalidLayout(
                "date_row_count must be > 0".to_string(),
            ));
        }
        if self.header_offset.checked_add(self.date_row_count).is_none() {
            return Err(ConfigError::InvalidLayout(format!(
                "header_offset {} + date_row_count {} exceeds the last addressable row",
                self.header_offset, self.date_row_count
            )));
        }
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidLayout(
                "date_format cannot be empty".to_string(),
            ));
        }
        // Unknown specifiers only surface when the format is rendered.
        let mut sample = String::new();
        if write!(sample, "{}", NaiveDate::default().format(&self.date_format)).is_err() {
            return Err(ConfigError::InvalidLayout(format!(
                "date_format `{}` is not a valid strftime pattern",
                self.date_format
            )));
        }
        Ok(())
    }
}

/// Logging options; `dir = None` logs to stderr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Immutable application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub valid_units: Vec<String>,
    #[serde(default)]
    pub authorized_users: Vec<UserId>,
    #[serde(default)]
    pub sheet: SheetLayout,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Holds a per-cell lock across each read-modify-write when `true`.
    #[serde(default = "default_serialize_increments")]
    pub serialize_increments: bool,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_serialize_increments() -> bool {
    true
}

impl AppConfig {
    /// Builds a config with default layout and the given units/users.
    pub fn new(valid_units: &[&str], authorized_users: &[i64]) -> Self {
        Self {
            valid_units: valid_units.iter().map(|unit| unit.to_string()).collect(),
            authorized_users: authorized_users.iter().copied().map(UserId).collect(),
            sheet: SheetLayout::default(),
            workers: DEFAULT_WORKERS,
            serialize_increments: true,
            store_path: None,
            logging: LoggingConfig::default(),
        }
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.valid_units()?;
        self.sheet.validate()?;
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(self.workers));
        }
        Ok(())
    }

    /// Builds the immutable valid-unit set.
    pub fn valid_units(&self) -> Result<ValidUnitSet, ConfigError> {
        ValidUnitSet::from_names(&self.valid_units)
    }
}

/// Read-only set of accepted units, compared in upper-case form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUnitSet {
    units: BTreeSet<Unit>,
}

impl ValidUnitSet {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let mut units = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let unit =
                Unit::parse(name).ok_or_else(|| ConfigError::InvalidUnit(name.to_string()))?;
            units.insert(unit);
        }
        if units.is_empty() {
            return Err(ConfigError::EmptyUnitList);
        }
        Ok(Self { units })
    }

    pub fn contains(&self, unit: Unit) -> bool {
        self.units.contains(&unit)
    }

    /// Units in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = Unit> + '_ {
        self.units.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn is_column_name(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, SheetLayout, ValidUnitSet};
    use crate::model::entry::Unit;

    #[test]
    fn default_layout_scans_b7_to_b101() {
        let layout = SheetLayout::default();
        assert_eq!(layout.first_date_row(), 7);
        assert_eq!(layout.last_date_row(), 101);
        assert_eq!(layout.row_for_position(1), 7);
    }

    #[test]
    fn column_mapping_is_static_per_flag() {
        let layout = SheetLayout::default();
        assert_eq!(layout.column_for(true), "D");
        assert_eq!(layout.column_for(false), "E");
        let unit = Unit::new('a').unwrap();
        assert_eq!(layout.cell(unit, true, 9).to_string(), "'Nau A'!D9");
    }

    #[test]
    fn valid_unit_set_upper_cases_members() {
        let set = ValidUnitSet::from_names(&["a", "B"]).unwrap();
        assert!(set.contains(Unit::new('A').unwrap()));
        assert!(set.contains(Unit::new('b').unwrap()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn valid_unit_set_rejects_empty_and_multi_letter() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ValidUnitSet::from_names(&empty),
            Err(ConfigError::EmptyUnitList)
        ));
        assert!(matches!(
            ValidUnitSet::from_names(&["AB"]),
            Err(ConfigError::InvalidUnit(_))
        ));
    }

    #[test]
    fn from_json_applies_defaults() {
        let config =
            AppConfig::from_json(r#"{"valid_units": ["A", "B"], "authorized_users": [42]}"#)
                .unwrap();
        assert_eq!(config.sheet, SheetLayout::default());
        assert_eq!(config.workers, 4);
        assert!(config.serialize_increments);
        assert_eq!(config.authorized_users.len(), 1);
    }

    #[test]
    fn from_json_rejects_template_without_placeholder() {
        let err = AppConfig::from_json(
            r#"{"valid_units": ["A"], "sheet": {"name_template": "Sheet1"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate(_)));
    }

    #[test]
    fn from_json_rejects_equal_columns() {
        let err = AppConfig::from_json(
            r#"{"valid_units": ["A"], "sheet": {"flag_column": "E", "plain_column": "E"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLayout(_)));
    }
}
