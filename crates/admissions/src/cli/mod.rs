//! Command-line interface for the admission register.
//!
//! This module provides the CLI structure for the `admit` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, GenderArg, ListCommand, OutputFormat,
    ReportCommand, ReportFormatArg, ShowCommand, StatsCommand, UpdateCommand,
};

/// admit - Keep the school admission register
///
/// Records admitted children, shows dashboard counts and exports the
/// age-by-class government admission report.
#[derive(Debug, Parser)]
#[command(name = "admit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Commands that read or change the register
    #[command(flatten)]
    Register(RegisterCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Commands that need the record store.
#[derive(Debug, Subcommand)]
pub enum RegisterCommand {
    /// Admit a new student
    Add(AddCommand),

    /// Show one record
    Show(ShowCommand),

    /// List records, most recently updated first
    List(ListCommand),

    /// Change fields of a record
    Update(UpdateCommand),

    /// Remove a record
    Delete(DeleteCommand),

    /// Show dashboard counts
    Stats(StatsCommand),

    /// Export the admission report
    Report(ReportCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
