//! Control entry domain model.
//!
//! # Responsibility
//! - Define active and completed control records.
//! - Validate user-provided names before anything is persisted.
//! - Provide the promotion step from active to completed.
//!
//! # Invariants
//! - `equipment_name` and `unit_name` are non-empty after trimming for every
//!   entry created through `ControlEntry::new`.
//! - `registered_at` is fixed at creation and copied verbatim on promotion.
//! - Duplicate entries are allowed; there is no uniqueness key.

use super::timestamp::Timestamp;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for user-provided entry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyEquipmentName,
    EmptyUnitName,
    /// Both fields missing; reported as one rejection.
    EmptyNames,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEquipmentName => write!(f, "equipment name must not be empty"),
            Self::EmptyUnitName => write!(f, "unit name must not be empty"),
            Self::EmptyNames => write!(f, "equipment name and unit name must not be empty"),
        }
    }
}

impl Error for EntryValidationError {}

/// Open control record held by the active registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEntry {
    pub equipment_name: String,
    pub unit_name: String,
    /// Stored with second precision; displayed with minute precision.
    pub registered_at: Timestamp,
}

impl ControlEntry {
    /// Builds a validated entry from raw form input.
    ///
    /// Both names are trimmed before validation and storage.
    pub fn new(
        equipment_name: &str,
        unit_name: &str,
        registered_at: NaiveDateTime,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            equipment_name: equipment_name.trim().to_string(),
            unit_name: unit_name.trim().to_string(),
            registered_at: Timestamp::from_datetime(registered_at),
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Checks the non-empty name invariant.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        let equipment_missing = self.equipment_name.trim().is_empty();
        let unit_missing = self.unit_name.trim().is_empty();
        match (equipment_missing, unit_missing) {
            (true, true) => Err(EntryValidationError::EmptyNames),
            (true, false) => Err(EntryValidationError::EmptyEquipmentName),
            (false, true) => Err(EntryValidationError::EmptyUnitName),
            (false, false) => Ok(()),
        }
    }

    /// Promotes this entry into a completed record.
    ///
    /// `completed_at` is clamped so it never precedes a parseable
    /// `registered_at`.
    pub fn complete(self, completed_at: NaiveDateTime) -> CompletedEntry {
        let completed_at = match self.registered_at.parse() {
            Some(registered) if registered > completed_at => registered,
            _ => completed_at,
        };
        CompletedEntry {
            equipment_name: self.equipment_name,
            unit_name: self.unit_name,
            registered_at: self.registered_at,
            completed_at: Timestamp::from_datetime(completed_at),
        }
    }
}

/// Historical record held by the completion log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedEntry {
    pub equipment_name: String,
    pub unit_name: String,
    pub registered_at: Timestamp,
    pub completed_at: Timestamp,
}

impl CompletedEntry {
    /// Calendar date used by the daily view; never persisted.
    pub fn registered_date(&self) -> Option<NaiveDate> {
        self.registered_at.date()
    }
}
