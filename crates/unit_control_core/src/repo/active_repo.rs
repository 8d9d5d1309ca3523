//! Active registry contract and CSV implementation.
//!
//! # Responsibility
//! - Hold open control entries in insertion order.
//! - Persist the full sequence after every mutation.
//!
//! # Invariants
//! - Entries are validated before they are appended.
//! - The cached snapshot only advances after a successful write.
//! - Positions are 0-based over the most recent `load()`.

use super::table::{read_rows, write_rows, TableSpec};
use super::{RepoError, RepoResult};
use crate::model::entry::ControlEntry;
use log::info;
use std::path::{Path, PathBuf};

const ACTIVE_TABLE: TableSpec = TableSpec {
    name: "active",
    header: &["설비명", "Unit명", "등록일시"],
};

/// Repository interface for open control entries.
pub trait ActiveRegistry {
    /// Reloads the persisted sequence; absent storage is an empty sequence.
    fn load(&mut self) -> RepoResult<Vec<ControlEntry>>;
    /// Appends one entry and persists the whole sequence.
    fn append(&mut self, entry: &ControlEntry) -> RepoResult<()>;
    /// Removes the entry at `index` and persists the remainder in order.
    fn remove_at(&mut self, index: usize) -> RepoResult<ControlEntry>;
    /// Last loaded or persisted snapshot.
    fn entries(&self) -> &[ControlEntry];
}

/// CSV-backed active registry.
#[derive(Debug)]
pub struct CsvActiveRegistry {
    path: PathBuf,
    entries: Vec<ControlEntry>,
}

impl CsvActiveRegistry {
    /// Creates a registry bound to `path` with an empty snapshot.
    ///
    /// Nothing is read until `load()` is called.
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

impl ActiveRegistry for CsvActiveRegistry {
    fn load(&mut self) -> RepoResult<Vec<ControlEntry>> {
        self.entries = read_rows(ACTIVE_TABLE, &self.path)?;
        Ok(self.entries.clone())
    }

    fn append(&mut self, entry: &ControlEntry) -> RepoResult<()> {
        entry.validate()?;

        let mut next = self.entries.clone();
        next.push(entry.clone());
        write_rows(ACTIVE_TABLE, &self.path, &next)?;
        self.entries = next;

        info!(
            "event=active_append module=repo status=ok rows={}",
            self.entries.len()
        );
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> RepoResult<ControlEntry> {
        if index >= self.entries.len() {
            return Err(RepoError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            });
        }

        let mut next = self.entries.clone();
        let removed = next.remove(index);
        write_rows(ACTIVE_TABLE, &self.path, &next)?;
        self.entries = next;

        info!(
            "event=active_remove module=repo status=ok index={} rows={}",
            index,
            self.entries.len()
        );
        Ok(removed)
    }

    fn entries(&self) -> &[ControlEntry] {
        &self.entries
    }
}
