//! `svcbook` - CLI for servicebook
//!
//! This binary provides the command-line interface for entering, finding,
//! printing and summarizing the shop's service records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use tracing::{info, warn};

use servicebook::actions::{self, DeleteOutcome};
use servicebook::backup::{self, BackupPolicy};
use servicebook::cli::{
    AddCommand, BackupCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand,
    OutputFormat, ReportCommand, TypesCommand,
};
use servicebook::output::{write_printout, write_records, write_report};
use servicebook::{init_logging, Config, Error, Report, ReportPeriod, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config commands must work even when the database cannot be opened
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config.as_deref(), config_cmd);
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let storage = open_storage(&config)?;

    if config.backup.enabled && cli.command.modifies_data() {
        auto_backup(&storage, &config);
    }

    run(&storage, &config, cli.config.as_deref(), cli.command)
}

fn run(
    storage: &Storage,
    config: &Config,
    config_path: Option<&Path>,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Add(cmd) => handle_add(storage, &cmd),
        Command::Edit(cmd) => handle_edit(storage, &cmd),
        Command::Delete(cmd) => handle_delete(storage, &cmd),
        Command::Search(cmd) => {
            let records = storage.search_records(&cmd.fragment)?;
            info!("Found {} records matching '{}'", records.len(), cmd.fragment);
            let mut out = io::stdout().lock();
            write_records(&mut out, &records, cmd.format)?;
            Ok(())
        }
        Command::List(cmd) => {
            let records = storage.all_records()?;
            let mut out = io::stdout().lock();
            write_records(&mut out, &records, cmd.format)?;
            Ok(())
        }
        Command::Show(cmd) => {
            let record = storage
                .get_record(cmd.id)?
                .ok_or(Error::RecordNotFound { id: cmd.id })?;
            let mut out = open_output(cmd.output.as_deref())?;
            write_printout(&mut out, &record, cmd.format)?;
            finish_output(out, cmd.output.as_deref())
        }
        Command::Report(cmd) => handle_report(storage, cmd),
        Command::Types(cmd) => handle_types(storage, cmd),
        Command::Backup(cmd) => handle_backup(storage, config, cmd),
        Command::Status(cmd) => handle_status(storage, config, cmd.json),
        Command::Config(cmd) => handle_config(config_path, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open_with_service_types(&path, &config.catalog.default_service_types)
        .with_context(|| format!("failed to open database {}", path.display()))
}

/// Take the periodic backup before data changes. Failure is logged, not fatal.
fn auto_backup(storage: &Storage, config: &Config) {
    let policy = BackupPolicy::from_config(config);
    match backup::backup_if_due(storage, &policy, Local::now()) {
        Ok(Some(path)) => info!("Automatic backup written to {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Automatic backup failed: {}", e),
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn finish_output(mut out: Box<dyn Write>, path: Option<&Path>) -> anyhow::Result<()> {
    out.flush()?;
    if let Some(path) = path {
        println!("Written to {}", path.display());
    }
    Ok(())
}

fn handle_add(storage: &Storage, cmd: &AddCommand) -> anyhow::Result<()> {
    let record = actions::new_record(storage, cmd, Local::now().date_naive())?;
    let id = storage.insert_record(&record)?;
    println!("Added record {id} ({})", record.date);
    Ok(())
}

fn handle_edit(storage: &Storage, cmd: &EditCommand) -> anyhow::Result<()> {
    let changes = actions::record_changes(storage, cmd)?;
    let record = actions::edit_record(storage, cmd.id, changes)?;
    println!("Updated record {}", record.id);
    Ok(())
}

fn handle_delete(storage: &Storage, cmd: &DeleteCommand) -> anyhow::Result<()> {
    match actions::delete_records(storage, cmd)? {
        DeleteOutcome::Preview(records) => {
            let mut out = io::stdout().lock();
            write_records(&mut out, &records, OutputFormat::Table)?;
            println!();
            println!("Run again with --yes to delete these records.");
        }
        DeleteOutcome::Deleted(records) => println!("Deleted {} record(s)", records.len()),
    }
    Ok(())
}

fn handle_report(storage: &Storage, cmd: ReportCommand) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let (period, output) = match cmd {
        ReportCommand::Monthly {
            year,
            month,
            output,
        } => (ReportPeriod::monthly(year, month, today)?, output),
        ReportCommand::Yearly { year, output } => (ReportPeriod::yearly(year, today), output),
    };

    let report = Report::generate(storage, period, today)?;
    if report.is_empty() {
        println!("{}: no data for the selected period", report.title());
        return Ok(());
    }

    let mut out = open_output(output.output.as_deref())?;
    write_report(&mut out, &report, output.format)?;
    finish_output(out, output.output.as_deref())
}

fn handle_types(storage: &Storage, cmd: TypesCommand) -> anyhow::Result<()> {
    match cmd {
        TypesCommand::List => {
            for service_type in storage.service_types()? {
                println!("{:>4}  {}", service_type.id, service_type.name);
            }
        }
        TypesCommand::Add { name } => {
            let service_type = storage.add_service_type(&name)?;
            println!(
                "Added service type {} with id {}",
                service_type.name, service_type.id
            );
        }
    }
    Ok(())
}

fn handle_backup(storage: &Storage, config: &Config, cmd: BackupCommand) -> anyhow::Result<()> {
    let mut policy = BackupPolicy::from_config(config);
    if let Some(directory) = cmd.directory {
        policy.directory = directory;
    }
    let path = backup::create_backup(storage, &policy, Local::now())
        .context("backup failed")?;
    println!("Backup written to {}", path.display());
    Ok(())
}

fn handle_status(storage: &Storage, config: &Config, json: bool) -> anyhow::Result<()> {
    let stats = storage.stats()?;
    let last_backup = storage.get_metadata(backup::LAST_BACKUP_KEY)?;
    let backup_dir = config.backup_dir();
    let stem = storage
        .path()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let backups = backup::list_backups(&backup_dir, &stem)?.len();

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "database_size_bytes": stats.db_size_bytes,
            "total_records": stats.total_records,
            "service_types": stats.service_types,
            "first_record": stats.first_record,
            "last_record": stats.last_record,
            "backup_directory": backup_dir,
            "backups": backups,
            "last_backup": last_backup,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let date = |d: Option<chrono::NaiveDate>| {
            d.map_or_else(|| "-".to_string(), |d| d.to_string())
        };
        println!("svcbook status");
        println!("--------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Records:       {}", stats.total_records);
        println!("Service types: {}", stats.service_types);
        println!("First record:  {}", date(stats.first_record));
        println!("Last record:   {}", date(stats.last_record));
        println!("Backups:       {} in {}", backups, backup_dir.display());
        println!(
            "Last backup:   {}",
            last_backup.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

fn handle_config(config_path: Option<&Path>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path.map(Path::to_path_buf))
                .context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!();
                println!("[Backup]");
                println!("  Enabled:         {}", config.backup.enabled);
                println!("  Directory:       {}", config.backup_dir().display());
                println!("  Interval (days): {}", config.backup.interval_days);
                println!("  Keep:            {}", config.backup.keep);
                println!();
                println!("[Catalog]");
                println!(
                    "  Service types:   {}",
                    config.catalog.default_service_types.join(", ")
                );
            }
        }
        ConfigCommand::Path => {
            let path = config_path.map_or_else(Config::default_config_path, Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or_else(|| config_path.map(Path::to_path_buf))
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
