//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the active registry and completion log into user actions.
//! - Keep the CLI (or any other front end) free of storage details.

pub mod clock;
pub mod control_service;
