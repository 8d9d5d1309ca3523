//! Domain model for equipment/unit control records.
//!
//! # Responsibility
//! - Define the active and completed record shapes shared by repositories and
//!   services.
//! - Keep timestamp text stable across load/save cycles.
//!
//! # Invariants
//! - An entry lives in exactly one store at a time.
//! - Completed records are append-only history.

pub mod entry;
pub mod timestamp;
