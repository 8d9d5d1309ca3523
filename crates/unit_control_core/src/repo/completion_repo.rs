//! Completion log contract and CSV implementation.
//!
//! # Responsibility
//! - Hold completed control entries as append-only history.
//! - Answer the daily-view queries (filter by registration date, date bounds).
//!
//! # Invariants
//! - Completed entries are never removed or rewritten by this crate.
//! - Date queries read the cached snapshot and never touch storage.
//! - Rows whose registration timestamp does not parse are kept but excluded
//!   from date results.

use super::table::{read_rows, write_rows, TableSpec};
use super::RepoResult;
use crate::model::entry::CompletedEntry;
use chrono::NaiveDate;
use log::info;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const COMPLETED_TABLE: TableSpec = TableSpec {
    name: "completed",
    header: &["설비명", "Unit명", "등록일시", "완료일시"],
};

/// Repository interface for completed control entries.
pub trait CompletionLog {
    /// Reloads the persisted history; absent storage is an empty history.
    fn load(&mut self) -> RepoResult<Vec<CompletedEntry>>;
    /// Appends one completed entry and persists the whole history.
    fn append(&mut self, entry: &CompletedEntry) -> RepoResult<()>;
    /// Last loaded or persisted snapshot.
    fn entries(&self) -> &[CompletedEntry];

    /// Entries registered on `date`, in stored order.
    fn filter_by_date(&self, date: NaiveDate) -> Vec<CompletedEntry> {
        self.entries()
            .iter()
            .filter(|entry| entry.registered_date() == Some(date))
            .cloned()
            .collect()
    }

    /// Distinct registration dates, ascending.
    fn distinct_registered_dates(&self) -> Vec<NaiveDate> {
        self.entries()
            .iter()
            .filter_map(CompletedEntry::registered_date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// CSV-backed completion log.
#[derive(Debug)]
pub struct CsvCompletionLog {
    path: PathBuf,
    entries: Vec<CompletedEntry>,
}

impl CsvCompletionLog {
    /// Creates a log bound to `path` with an empty snapshot.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CompletionLog for CsvCompletionLog {
    fn load(&mut self) -> RepoResult<Vec<CompletedEntry>> {
        self.entries = read_rows(COMPLETED_TABLE, &self.path)?;
        Ok(self.entries.clone())
    }

    fn append(&mut self, entry: &CompletedEntry) -> RepoResult<()> {
        let mut next = self.entries.clone();
        next.push(entry.clone());
        write_rows(COMPLETED_TABLE, &self.path, &next)?;
        self.entries = next;

        info!(
            "event=completed_append module=repo status=ok rows={}",
            self.entries.len()
        );
        Ok(())
    }

    fn entries(&self) -> &[CompletedEntry] {
        &self.entries
    }
}
