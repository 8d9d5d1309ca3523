//! Command-line front end for the unit control registry.
//!
//! # Responsibility
//! - Map subcommands onto `ControlService` operations.
//! - Render entries with minute-precision timestamps.
//!
//! # Invariants
//! - No business rules live here; validation and ordering stay in core.
//! - Every failure is reported on stderr with a non-zero exit code.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use unit_control_core::{
    init_logging, ActiveRegistry, CompletedEntry, CompletedListing, CompletionLog, ControlConfig,
    ControlEntry, ControlService, ControlServiceError, CsvActiveRegistry, CsvCompletionLog,
};

#[derive(Debug, Parser)]
#[command(name = "unit_control", version, about = "Equipment/unit control registry")]
struct Cli {
    /// Directory holding the active and completed tables.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new control entry.
    Register { equipment: String, unit: String },
    /// Mark the active entry at INDEX as completed.
    Complete { index: usize },
    /// Delete the active entry at INDEX without completing it.
    Delete { index: usize },
    /// Show entries currently under control.
    List,
    /// Show completed entries registered on one day.
    Completed {
        /// Day to show (YYYY-MM-DD); defaults to today or the latest day.
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Show the registration days present in the completed table.
    Dates,
}

type Service = ControlService<CsvActiveRegistry, CsvCompletionLog>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ControlConfig::from_env(cli.data_dir.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let mut service = config.open_service();
    match run(&mut service, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(service: &mut Service, command: Command) -> Result<(), ControlServiceError> {
    match command {
        Command::Register { equipment, unit } => {
            service.register(&equipment, &unit)?;
            println!("Control registered.");
        }
        Command::Complete { index } => {
            let done = service.complete(index)?;
            println!(
                "Control completed: {} / {} at {}",
                done.equipment_name, done.unit_name, done.completed_at
            );
        }
        Command::Delete { index } => {
            service.delete(index)?;
            println!("Deleted.");
        }
        Command::List => print_active(&service.list_active()?),
        Command::Completed { date } => {
            let listing = service.list_completed_on(date)?;
            let stored_rows = service.completion_log().entries().len();
            for line in render_completed(&listing, stored_rows) {
                println!("{line}");
            }
        }
        Command::Dates => {
            for day in service.distinct_registered_dates()? {
                println!("{day}");
            }
        }
    }

    log::debug!(
        "event=cli_command module=cli status=ok active_rows={} completed_rows={}",
        service.active_registry().entries().len(),
        service.completion_log().entries().len()
    );
    Ok(())
}

fn print_active(entries: &[ControlEntry]) {
    if entries.is_empty() {
        println!("No equipment is currently under control.");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "[{index}] equipment: {} | unit: {} | registered: {}",
            entry.equipment_name, entry.unit_name, entry.registered_at
        );
    }
}

/// Lines for the daily completed view; `stored_rows` counts every row in the
/// completed table, including rows without a readable registration date.
fn render_completed(listing: &CompletedListing, stored_rows: usize) -> Vec<String> {
    let bounds = match listing.bounds {
        Some(bounds) => bounds,
        None if stored_rows == 0 => return vec!["No completed items.".to_string()],
        None => {
            return vec![format!(
                "{stored_rows} completed item(s) have no readable registration date."
            )]
        }
    };

    let mut lines = vec![format!("Available: {} .. {}", bounds.min, bounds.max)];
    let day = listing
        .date
        .map(|value| value.to_string())
        .unwrap_or_default();
    if listing.is_empty() {
        lines.push(format!("No items completed for {day}."));
        return lines;
    }

    lines.push(format!("Completed for {day}:"));
    lines.extend(listing.entries.iter().enumerate().map(|(position, entry)| {
        completed_line(position + 1, entry)
    }));
    lines
}

fn completed_line(number: usize, entry: &CompletedEntry) -> String {
    format!(
        "{:>3}. equipment: {} | unit: {} | registered: {} | completed: {}",
        number, entry.equipment_name, entry.unit_name, entry.registered_at, entry.completed_at
    )
}

fn failure_message(err: &ControlServiceError) -> String {
    match err {
        ControlServiceError::Validation(_) => {
            "Please enter both the equipment name and the unit.".to_string()
        }
        ControlServiceError::StaleIndex { .. } => {
            format!("Item no longer available; run `list` to refresh. ({err})")
        }
        ControlServiceError::Persistence(_) => format!("Storage error: {err}"),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD, got `{raw}`: {err}"))
}
