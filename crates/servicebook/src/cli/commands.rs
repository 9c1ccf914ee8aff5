//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Service date as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Vehicle chassis number (VIN)
    #[arg(long)]
    pub chassis: String,

    /// Registration plate
    #[arg(long)]
    pub plate: String,

    /// Make and model, e.g. "VW Golf 6"
    #[arg(long)]
    pub model: String,

    /// Service type, by id or name
    #[arg(short = 't', long)]
    pub service_type: String,

    /// Description of the work done
    #[arg(long, default_value = "")]
    pub description: String,

    /// Price in whole currency units
    #[arg(short, long)]
    pub price: String,
}

/// Edit command arguments. Omitted fields keep their stored value.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Record id
    pub id: i64,

    /// New service date as YYYY-MM-DD
    #[arg(short, long)]
    pub date: Option<String>,

    /// New chassis number
    #[arg(long)]
    pub chassis: Option<String>,

    /// New registration plate
    #[arg(long)]
    pub plate: Option<String>,

    /// New make and model
    #[arg(long)]
    pub model: Option<String>,

    /// New service type, by id or name
    #[arg(short = 't', long)]
    pub service_type: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// New price
    #[arg(short, long)]
    pub price: Option<String>,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Ids of the records to delete
    #[arg(required = true)]
    pub ids: Vec<i64>,

    /// Actually delete; without this only the matching records are shown
    #[arg(short, long)]
    pub yes: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in the chassis number
    pub fragment: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    pub id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Write the printout to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Report commands.
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Summary of one month, by service type
    Monthly {
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month, 1-12 (defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        #[command(flatten)]
        output: ReportOutput,
    },

    /// Summary of one year, by service type
    Yearly {
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        #[command(flatten)]
        output: ReportOutput,
    },
}

/// Where and how a report is written.
#[derive(Debug, Args)]
pub struct ReportOutput {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Service type catalog commands.
#[derive(Debug, Subcommand)]
pub enum TypesCommand {
    /// List the service types
    List,

    /// Add a service type
    Add {
        /// Name of the new service type
        name: String,
    },
}

/// Backup command arguments.
#[derive(Debug, Args)]
pub struct BackupCommand {
    /// Directory to write the backup to (defaults to the configured one)
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// Comma-separated values
    Csv,
    /// JSON output
    Json,
}
