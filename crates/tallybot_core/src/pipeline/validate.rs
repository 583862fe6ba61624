//! Unit validator against the configured valid-unit set.

use crate::config::ValidUnitSet;
use crate::error::EntryError;
use crate::model::entry::Unit;
use log::{info, warn};

/// Checks extracted units against the immutable `ValidUnitSet`.
#[derive(Debug, Clone)]
pub struct UnitValidator {
    units: ValidUnitSet,
}

impl UnitValidator {
    pub fn new(units: ValidUnitSet) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &ValidUnitSet {
        &self.units
    }

    pub fn is_valid(&self, unit: Unit) -> bool {
        self.units.contains(unit)
    }

    /// Returns the unit when accepted, `UnknownUnit` otherwise. No side effects
    /// beyond logging.
    pub fn validate(&self, unit: Unit) -> Result<Unit, EntryError> {
        if self.is_valid(unit) {
            info!("event=unit_validate module=pipeline status=ok unit={unit}");
            return Ok(unit);
        }
        warn!("event=unit_validate module=pipeline status=rejected unit={unit}");
        Err(EntryError::UnknownUnit {
            unit,
            valid: self.units.iter().collect(),
        })
    }
}
