//! Repository layer contracts and flat-file persistence.
//!
//! # Responsibility
//! - Define the active-registry and completion-log contracts.
//! - Keep CSV layout and atomic file replacement inside the persistence
//!   boundary.
//!
//! # Invariants
//! - A failed write leaves the in-memory snapshot at the last persisted state.
//! - A missing table file reads as an empty table.

use crate::model::entry::EntryValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod active_repo;
pub mod completion_repo;
mod table;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for table persistence and positional access.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    InvalidData(String),
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
}

impl RepoError {
    /// Returns whether this error came from storage rather than the caller.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Csv { .. } | Self::InvalidData(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "csv error in `{}`: {source}", path.display()),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for {len} entries")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::InvalidData(_) | Self::IndexOutOfBounds { .. } => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}
