//! `avgang` - CLI for the departure registry
//!
//! This binary opens the configured registry and runs one command against it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use avgang::cli::{
    render_stats, render_table, Cli, Command, ConfigCommand, DeleteCommand, ExportCommand,
    ImportCommand, ListCommand, OutputFormat, RegistryCommand, StatsCommand,
};
use avgang::export::{self, CsvOptions, ExportFormat};
use avgang::import::ImportPolicy;
use avgang::{init_logging, Config, DepartureInput, Registry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        // Configuration commands must work even when the file is broken.
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
        Command::Registry(command) => run(cli.config, command),
    }
}

fn run(config_path: Option<PathBuf>, command: RegistryCommand) -> Result<()> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    let mut registry = Registry::open(&config)
        .with_context(|| format!("failed to open registry at {}", config.data_path().display()))?;

    match command {
        RegistryCommand::Add(args) => {
            let created = registry.add(&DepartureInput::from(args))?;
            println!("Added departure {} ({})", created.id, created.unit_number);
        }
        RegistryCommand::Edit(edit) => {
            let updated = registry.update(edit.id, &DepartureInput::from(edit.departure))?;
            println!("Updated departure {} ({})", updated.id, updated.unit_number);
        }
        RegistryCommand::Delete(delete) => handle_delete(&mut registry, &delete)?,
        RegistryCommand::Clear { yes } => handle_clear(&mut registry, yes)?,
        RegistryCommand::List(list) => handle_list(&registry, &config, &list)?,
        RegistryCommand::Stats(stats) => handle_stats(&registry, &stats)?,
        RegistryCommand::Export(export) => handle_export(&registry, &export)?,
        RegistryCommand::Import(import) => handle_import(&mut registry, &import)?,
        RegistryCommand::Seed => {
            let summary = registry.seed()?;
            println!("Example departures: {summary}");
        }
    }
    Ok(())
}

fn handle_delete(registry: &mut Registry, cmd: &DeleteCommand) -> Result<()> {
    let Some(departure) = registry.get(cmd.id) else {
        return Err(avgang::Error::NotFound { id: cmd.id }.into());
    };

    if !cmd.yes {
        println!(
            "This will delete departure {} ({} to {} at {}).",
            departure.id, departure.unit_number, departure.destination, departure.departure_time
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let removed = registry.delete(cmd.id)?;
    println!("Deleted departure {} ({})", removed.id, removed.unit_number);
    Ok(())
}

fn handle_clear(registry: &mut Registry, yes: bool) -> Result<()> {
    if !yes {
        println!("This will delete all {} departures.", registry.len());
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let removed = registry.clear()?;
    println!("Removed {removed} departures");
    Ok(())
}

fn handle_list(registry: &Registry, config: &Config, cmd: &ListCommand) -> Result<()> {
    let departures = registry.list(&cmd.filter.to_filter(), cmd.sort.map(Into::into));

    match cmd.format {
        OutputFormat::Table => print!("{}", render_table(&departures)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&departures)?),
        OutputFormat::Csv => {
            let options = CsvOptions {
                bom: false,
                ..CsvOptions::from_config(&config.export)?
            };
            std::io::stdout().write_all(&export::to_csv(&departures, options)?)?;
        }
    }
    Ok(())
}

fn handle_stats(registry: &Registry, cmd: &StatsCommand) -> Result<()> {
    let stats = registry.stats(&cmd.filter.to_filter());
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", render_stats(&stats));
    }
    Ok(())
}

fn handle_export(registry: &Registry, cmd: &ExportCommand) -> Result<()> {
    let format = ExportFormat::from(cmd.format);
    let bytes = registry.export(format, &cmd.filter.to_filter())?;

    let path = cmd.output.clone().unwrap_or_else(|| {
        PathBuf::from(format.default_file_name(chrono::Local::now().date_naive()))
    });
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;

    println!("Exported to {}", path.display());
    Ok(())
}

fn handle_import(registry: &mut Registry, cmd: &ImportCommand) -> Result<()> {
    let payload = fs::read_to_string(&cmd.file)
        .with_context(|| format!("failed to read {}", cmd.file.display()))?;
    let policy = cmd
        .policy
        .map_or_else(|| registry.import_policy(), ImportPolicy::from);

    if policy == ImportPolicy::Replace && !registry.is_empty() && !cmd.yes {
        println!(
            "Importing {} with the replace policy will delete all {} current departures.",
            cmd.file.display(),
            registry.len()
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let summary = registry.import(&payload, Some(policy))?;
    println!("Imported {}: {summary}", cmd.file.display());
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {}", config.storage.backend);
                println!("  Data path:          {}", config.data_path().display());
                println!();
                println!("[Validation]");
                println!(
                    "  Enforce pattern:    {}",
                    config.validation.enforce_unit_pattern
                );
                println!("  Unit pattern:       {}", config.validation.unit_pattern);
                println!();
                println!("[Import]");
                println!("  Policy:             {}", config.import.policy);
                println!();
                println!("[Export]");
                println!("  CSV delimiter:      {}", config.export.csv_delimiter);
                println!("  CSV BOM:            {}", config.export.csv_bom);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
