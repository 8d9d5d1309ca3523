//! Core domain logic for the unit control registry.
//! Owns entry validation, flat-file persistence and the register/complete/delete
//! use-cases; front ends only render what this crate returns.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ControlConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{CompletedEntry, ControlEntry, EntryValidationError};
pub use model::timestamp::Timestamp;
pub use repo::active_repo::{ActiveRegistry, CsvActiveRegistry};
pub use repo::completion_repo::{CompletionLog, CsvCompletionLog};
pub use repo::{RepoError, RepoResult};
pub use service::clock::{Clock, LocalClock};
pub use service::control_service::{
    CompletedListing, ControlService, ControlServiceError, DateBounds, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
