//! Runtime configuration for data and log locations.
//!
//! # Responsibility
//! - Resolve table paths, log level and log directory from the environment.
//! - Build a ready-to-use CSV-backed service.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - `log_dir` is always absolute.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::active_repo::CsvActiveRegistry;
use crate::repo::completion_repo::CsvCompletionLog;
use crate::service::control_service::ControlService;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "UNIT_CONTROL_DATA_DIR";
pub const ENV_ACTIVE_FILE: &str = "UNIT_CONTROL_ACTIVE_FILE";
pub const ENV_COMPLETED_FILE: &str = "UNIT_CONTROL_COMPLETED_FILE";
pub const ENV_LOG_LEVEL: &str = "UNIT_CONTROL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "UNIT_CONTROL_LOG_DIR";

pub const DEFAULT_ACTIVE_FILE: &str = "data.csv";
pub const DEFAULT_COMPLETED_FILE: &str = "completed.csv";
const DEFAULT_LOG_SUBDIR: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    InvalidLogLevel(String),
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::CurrentDir(err) => write!(f, "failed to resolve working directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(_) => None,
            Self::CurrentDir(err) => Some(err),
        }
    }
}

/// Resolved locations and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlConfig {
    pub data_dir: PathBuf,
    pub active_file: String,
    pub completed_file: String,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl ControlConfig {
    /// Resolves configuration from process environment variables.
    ///
    /// `data_dir` overrides `UNIT_CONTROL_DATA_DIR` when provided.
    pub fn from_env(data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd, data_dir)
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// Relative paths are anchored at `cwd` when an absolute path is needed.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cwd: &Path,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = data_dir
            .or_else(|| non_blank(ENV_DATA_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let active_file =
            non_blank(ENV_ACTIVE_FILE).unwrap_or_else(|| DEFAULT_ACTIVE_FILE.to_string());
        let completed_file =
            non_blank(ENV_COMPLETED_FILE).unwrap_or_else(|| DEFAULT_COMPLETED_FILE.to_string());

        let log_level = match non_blank(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = non_blank(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_LOG_SUBDIR));
        let log_dir = if log_dir.is_absolute() {
            log_dir
        } else {
            cwd.join(log_dir)
        };

        Ok(Self {
            data_dir,
            active_file,
            completed_file,
            log_level,
            log_dir,
        })
    }

    pub fn active_path(&self) -> PathBuf {
        self.data_dir.join(&self.active_file)
    }

    pub fn completed_path(&self) -> PathBuf {
        self.data_dir.join(&self.completed_file)
    }

    /// Builds a CSV-backed service over the configured tables.
    pub fn open_service(&self) -> ControlService<CsvActiveRegistry, CsvCompletionLog> {
        ControlService::new(
            CsvActiveRegistry::new(self.active_path()),
            CsvCompletionLog::new(self.completed_path()),
        )
    }
}
