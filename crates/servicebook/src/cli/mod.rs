//! Command-line interface for servicebook.
//!
//! This module provides the CLI structure for the `svcbook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, BackupCommand, ConfigCommand, DeleteCommand, EditCommand, ListCommand,
    OutputFormat, ReportCommand, ReportOutput, SearchCommand, ShowCommand, StatusCommand,
    TypesCommand,
};

/// svcbook - Service record book for a vehicle-service shop
///
/// Keeps a record of every job done on a vehicle, finds records by chassis
/// number, prints service sheets and produces monthly and yearly summaries.
#[derive(Debug, Parser)]
#[command(name = "svcbook")]
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
    /// Add a service record
    Add(AddCommand),

    /// Change fields of a service record
    Edit(EditCommand),

    /// Delete service records
    Delete(DeleteCommand),

    /// Find records by chassis number fragment
    Search(SearchCommand),

    /// List all records
    List(ListCommand),

    /// Print the service sheet of one record
    Show(ShowCommand),

    /// Produce a summary report
    #[command(subcommand)]
    Report(ReportCommand),

    /// Manage service types
    #[command(subcommand)]
    Types(TypesCommand),

    /// Back up the database now
    Backup(BackupCommand),

    /// Show database status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command changes stored data.
    #[must_use]
    pub fn modifies_data(&self) -> bool {
        matches!(
            self,
            Self::Add(_)
                | Self::Edit(_)
                | Self::Delete(DeleteCommand { yes: true, .. })
                | Self::Types(TypesCommand::Add { .. })
        )
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
