//! Control entry use-case service.
//!
//! # Responsibility
//! - Register, complete and delete control entries.
//! - Resolve the daily completed-items view.
//!
//! # Invariants
//! - Every operation reloads the stores it reads before acting.
//! - Completion appends to the log before removing from the active registry;
//!   a failed log write leaves the active entry in place.
//! - Invalid input never reaches a repository.

use crate::model::entry::{CompletedEntry, ControlEntry, EntryValidationError};
use crate::repo::active_repo::ActiveRegistry;
use crate::repo::completion_repo::CompletionLog;
use crate::repo::RepoError;
use crate::service::clock::{Clock, LocalClock};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ControlServiceError>;

/// Service error for control entry use-cases.
#[derive(Debug)]
pub enum ControlServiceError {
    /// Required input missing; nothing was changed.
    Validation(EntryValidationError),
    /// Target position no longer exists; the caller should refresh.
    StaleIndex { index: usize, len: usize },
    /// Storage read or write failed.
    Persistence(RepoError),
}

impl Display for ControlServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::StaleIndex { index, len } => write!(
                f,
                "item #{index} is no longer available ({len} active item(s))"
            ),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControlServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StaleIndex { .. } => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for ControlServiceError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ControlServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::IndexOutOfBounds { index, len } => Self::StaleIndex { index, len },
            other => Self::Persistence(other),
        }
    }
}

/// Inclusive range of registration dates present in the completion log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// Daily completed-items view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedListing {
    /// Effective date; `None` only when no completed entry has a usable date.
    pub date: Option<NaiveDate>,
    /// Picker bounds; `None` under the same condition as `date`.
    pub bounds: Option<DateBounds>,
    /// Entries registered on `date`, in stored order.
    pub entries: Vec<CompletedEntry>,
}

impl CompletedListing {
    /// `true` is the "no items for this date" signal.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Service facade over the active registry and completion log.
pub struct ControlService<A: ActiveRegistry, L: CompletionLog, C: Clock = LocalClock> {
    active: A,
    log: L,
    clock: C,
}

impl<A: ActiveRegistry, L: CompletionLog> ControlService<A, L, LocalClock> {
    /// Creates a service stamping times from the local wall clock.
    pub fn new(active: A, log: L) -> Self {
        Self::with_clock(active, log, LocalClock)
    }
}

impl<A: ActiveRegistry, L: CompletionLog, C: Clock> ControlService<A, L, C> {
    /// Creates a service with an explicit clock source.
    pub fn with_clock(active: A, log: L, clock: C) -> Self {
        Self { active, log, clock }
    }

    pub fn active_registry(&self) -> &A {
        &self.active
    }

    pub fn completion_log(&self) -> &L {
        &self.log
    }

    /// Registers a new active entry from form input.
    ///
    /// # Contract
    /// - Both names are trimmed; an empty name yields `Validation` and no write.
    /// - `registered_at` is stamped from the service clock.
    /// - Returns the stored entry; the caller clears its inputs on `Ok`.
    pub fn register(&mut self, equipment_name: &str, unit_name: &str) -> ServiceResult<ControlEntry> {
        let entry = match ControlEntry::new(equipment_name, unit_name, self.clock.now()) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("event=register module=service status=rejected reason={err}");
                return Err(err.into());
            }
        };

        self.active.load()?;
        self.active.append(&entry)?;

        info!(
            "event=register module=service status=ok active_rows={}",
            self.active.entries().len()
        );
        Ok(entry)
    }

    /// Promotes the active entry at `index` into the completion log.
    ///
    /// # Contract
    /// - The log append happens first; on failure the active entry remains.
    /// - Returns `StaleIndex` when `index` is outside the reloaded snapshot.
    /// - Returns the completed record on success.
    pub fn complete(&mut self, index: usize) -> ServiceResult<CompletedEntry> {
        let snapshot = self.active.load()?;
        let entry = snapshot
            .get(index)
            .cloned()
            .ok_or(ControlServiceError::StaleIndex {
                index,
                len: snapshot.len(),
            })?;
        let completed = entry.complete(self.clock.now());

        self.log.load()?;
        if let Err(err) = self.log.append(&completed) {
            warn!(
                "event=complete module=service status=error index={index} stage=log_append error={err}"
            );
            return Err(err.into());
        }

        if let Err(err) = self.active.remove_at(index) {
            // The entry is now in both tables; it is duplicated, not lost.
            error!(
                "event=complete module=service status=partial index={index} stage=active_remove error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=complete module=service status=ok index={} active_rows={} completed_rows={}",
            index,
            self.active.entries().len(),
            self.log.entries().len()
        );
        Ok(completed)
    }

    /// Removes the active entry at `index` without promotion.
    pub fn delete(&mut self, index: usize) -> ServiceResult<ControlEntry> {
        self.active.load()?;
        let removed = self.active.remove_at(index)?;

        info!(
            "event=delete module=service status=ok index={} active_rows={}",
            index,
            self.active.entries().len()
        );
        Ok(removed)
    }

    /// Returns the freshly loaded active entries in stored order.
    pub fn list_active(&mut self) -> ServiceResult<Vec<ControlEntry>> {
        Ok(self.active.load()?)
    }

    /// Distinct registration dates across completed entries, ascending.
    pub fn distinct_registered_dates(&mut self) -> ServiceResult<Vec<NaiveDate>> {
        self.log.load()?;
        Ok(self.log.distinct_registered_dates())
    }

    /// Resolves the daily completed-items view.
    ///
    /// # Contract
    /// - `Some(date)` is used as given, even outside the available bounds.
    /// - `None` selects today when today has entries, otherwise the most
    ///   recent available date.
    /// - An empty `entries` list means "no items for this date".
    pub fn list_completed_on(&mut self, date: Option<NaiveDate>) -> ServiceResult<CompletedListing> {
        self.log.load()?;
        let dates = self.log.distinct_registered_dates();
        let bounds = match (dates.first(), dates.last()) {
            (Some(min), Some(max)) => Some(DateBounds {
                min: *min,
                max: *max,
            }),
            _ => None,
        };

        let effective = date.or_else(|| {
            let today = self.clock.today();
            if dates.binary_search(&today).is_ok() {
                Some(today)
            } else {
                dates.last().copied()
            }
        });
        let entries = effective
            .map(|day| self.log.filter_by_date(day))
            .unwrap_or_default();

        info!(
            "event=list_completed module=service status=ok explicit_date={} rows={}",
            date.is_some(),
            entries.len()
        );
        Ok(CompletedListing {
            date: effective,
            bounds,
            entries,
        })
    }
}
