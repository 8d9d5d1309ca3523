//! Stored timestamp value.
//!
//! # Responsibility
//! - Keep the exact text persisted in the tables.
//! - Parse leniently for filtering and minute-precision display.
//!
//! # Invariants
//! - The raw text is never rewritten; an unparseable value survives a
//!   load/save cycle untouched.
//! - Parse failures degrade to `None` / raw display, never to errors.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage format for timestamps stamped by this crate.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Display format used at every user-facing boundary.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp as persisted in a table cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Formats a local datetime with full second precision.
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self(value.format(STORAGE_FORMAT).to_string())
    }

    /// Wraps raw stored text as-is.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the stored text; `None` when it matches no accepted shape.
    pub fn parse(&self) -> Option<NaiveDateTime> {
        let text = self.0.trim();
        if text.is_empty() {
            return None;
        }

        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }

    /// Calendar date portion, if the value parses.
    pub fn date(&self) -> Option<NaiveDate> {
        self.parse().map(|value| value.date())
    }

    /// Minute-precision rendering, falling back to the raw text.
    pub fn display_minutes(&self) -> String {
        match self.parse() {
            Some(value) => value.format(DISPLAY_FORMAT).to_string(),
            None => self.0.clone(),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_minutes())
    }
}
