//! CSV table codec shared by both repositories.
//!
//! # Responsibility
//! - Read a table positionally, ignoring header text and trailing columns.
//! - Replace a table file atomically with a freshly encoded copy.
//!
//! # Invariants
//! - Readers never observe a partially written table: writes go to a sibling
//!   temp file which is renamed over the target.
//! - Missing and zero-length files decode as empty tables.
//! - Replacing a table keeps the target's existing permissions; new tables
//!   are created world-readable on unix.

use super::{RepoError, RepoResult};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, Permissions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Static description of one persisted table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableSpec {
    /// Short name used in logs and error messages.
    pub name: &'static str,
    pub header: &'static [&'static str],
}

impl TableSpec {
    fn columns(&self) -> usize {
        self.header.len()
    }
}

/// Decodes every row of `path`, or returns an empty table when it is absent.
pub(crate) fn read_rows<T: DeserializeOwned>(spec: TableSpec, path: &Path) -> RepoResult<Vec<T>> {
    let started_at = Instant::now();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(
                "event=table_load module=repo status=ok table={} rows=0 missing=true",
                spec.name
            );
            return Ok(Vec::new());
        }
        Err(err) => {
            error!(
                "event=table_load module=repo status=error table={} error_code=open_failed error={}",
                spec.name, err
            );
            return Err(RepoError::Io {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (position, record) in reader.records().enumerate() {
        let record = record.map_err(|err| RepoError::Csv {
            path: path.to_path_buf(),
            source: err,
        })?;
        if record.len() < spec.columns() {
            return Err(RepoError::InvalidData(format!(
                "{} row {} has {} column(s), expected {}",
                spec.name,
                position + 1,
                record.len(),
                spec.columns()
            )));
        }

        let leading: csv::StringRecord = record.iter().take(spec.columns()).collect();
        let row = leading.deserialize::<T>(None).map_err(|err| RepoError::Csv {
            path: path.to_path_buf(),
            source: err,
        })?;
        rows.push(row);
    }

    debug!(
        "event=table_load module=repo status=ok table={} rows={} duration_ms={}",
        spec.name,
        rows.len(),
        started_at.elapsed().as_millis()
    );
    Ok(rows)
}

/// Encodes `rows` with a header line and atomically replaces `path`.
///
/// Creates the parent directory on first write.
pub(crate) fn write_rows<T: Serialize>(spec: TableSpec, path: &Path, rows: &[T]) -> RepoResult<()> {
    let started_at = Instant::now();
    match replace_table(spec, path, rows) {
        Ok(()) => {
            debug!(
                "event=table_save module=repo status=ok table={} rows={} duration_ms={}",
                spec.name,
                rows.len(),
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=table_save module=repo status=error table={} rows={} duration_ms={} error={}",
                spec.name,
                rows.len(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn replace_table<T: Serialize>(spec: TableSpec, path: &Path, rows: &[T]) -> RepoResult<()> {
    let io_error = |source: std::io::Error| RepoError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_error = |source: csv::Error| RepoError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(io_error)?;

    let permissions = match std::fs::metadata(path) {
        Ok(existing) => Some(existing.permissions()),
        Err(err) if err.kind() == ErrorKind::NotFound => new_table_permissions(),
        Err(err) => return Err(io_error(err)),
    };

    let mut staged = NamedTempFile::new_in(parent).map_err(io_error)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(staged.as_file_mut());
        writer.write_record(spec.header).map_err(csv_error)?;
        for row in rows {
            writer.serialize(row).map_err(csv_error)?;
        }
        writer.flush().map_err(io_error)?;
    }
    staged.as_file_mut().flush().map_err(io_error)?;
    if let Some(permissions) = permissions {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(io_error)?;
    }
    staged.as_file().sync_all().map_err(io_error)?;
    staged.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

// Temp files are created owner-only; new tables get 0644.
#[cfg(unix)]
fn new_table_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_table_permissions() -> Option<Permissions> {
    None
}
