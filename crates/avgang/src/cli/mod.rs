//! Command-line interface for the departure registry.
//!
//! This module provides the CLI structure for the `avgang` binary.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DeleteCommand, DepartureArgs, EditCommand, ExportCommand, ExportFormatArg,
    FilterArgs, ImportCommand, ListCommand, OutputFormat, PolicyArg, SortArg, StatsCommand,
};
pub use output::{render_stats, render_table};

/// avgang - Keep track of outgoing departures
///
/// Register trains, trucks, trailers and modules leaving the terminal, search
/// and sort them, and move them in and out as CSV or JSON.
#[derive(Debug, Parser)]
#[command(name = "avgang")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
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
    /// Commands that open the registry.
    #[command(flatten)]
    Registry(RegistryCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Commands that run against an open registry.
#[derive(Debug, Subcommand)]
pub enum RegistryCommand {
    /// Register a new departure
    Add(DepartureArgs),

    /// Replace every field of an existing departure
    Edit(EditCommand),

    /// Remove one departure
    Delete(DeleteCommand),

    /// Remove every departure
    Clear {
        /// Confirm removing everything
        #[arg(short, long)]
        yes: bool,
    },

    /// List departures
    List(ListCommand),

    /// Show counts per type, status and destination
    Stats(StatsCommand),

    /// Write departures to a CSV or JSON file
    Export(ExportCommand),

    /// Read departures from a JSON backup
    Import(ImportCommand),

    /// Add the example departures
    Seed,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::{DepartureId, Destination, TransportType};
    use crate::status::Status;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Registry(RegistryCommand::Seed),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "avgang");
    }

    #[test]
    fn test_verbosity() {
        use crate::logging::Verbosity;
        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Debug);
        assert_eq!(cli(3, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = vec![
            "avgang", "add", "-u", "tog1234", "-d", "trondheim", "-t", "8:30", "-g", "G1",
            "--type", "Tog", "-s", "Levert", "--comment", "Hei",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Registry(RegistryCommand::Add(add)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(add.unit, "tog1234");
        assert_eq!(add.destination, Destination::Trondheim);
        assert_eq!(add.time.to_string(), "08:30");
        assert_eq!(add.transport_type, TransportType::Train);
        assert_eq!(add.status, Status::Delivered);
        assert_eq!(add.comment.as_deref(), Some("Hei"));
    }

    #[test]
    fn test_parse_add_rejects_unknown_destination() {
        let args = vec![
            "avgang", "add", "-u", "TOG1234", "-d", "OSLO", "-t", "08:30", "-g", "G1", "--type",
            "Train", "-s", "Planned",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_add_requires_fields() {
        let args = vec!["avgang", "add", "-u", "TOG1234"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_edit() {
        let args = vec![
            "avgang", "edit", "42", "-u", "BIL5678", "-d", "MOLDE", "-t", "09:00", "-g", "A1",
            "--type", "Truck", "-s", "Loading",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Registry(RegistryCommand::Edit(edit)) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(edit.id, DepartureId::new(42));
        assert_eq!(edit.departure.status, Status::Loading);
    }

    #[test]
    fn test_parse_delete() {
        let cli = Cli::try_parse_from(vec!["avgang", "delete", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Registry(RegistryCommand::Delete(DeleteCommand { yes: false, .. }))
        ));

        let cli = Cli::try_parse_from(vec!["avgang", "delete", "7", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Registry(RegistryCommand::Delete(DeleteCommand { yes: true, .. }))
        ));

        assert!(Cli::try_parse_from(vec!["avgang", "delete", "seven"]).is_err());
    }

    #[test]
    fn test_parse_list() {
        let args = vec![
            "avgang", "list", "--search", "tog", "-d", "Molde", "--sort", "destination", "-f",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Registry(RegistryCommand::List(list)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(list.filter.search.as_deref(), Some("tog"));
        assert_eq!(list.filter.destination, Some(Destination::Molde));
        assert_eq!(list.sort, Some(SortArg::Destination));
        assert_eq!(list.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(vec!["avgang", "list"]).unwrap();
        let Command::Registry(RegistryCommand::List(list)) = cli.command else {
            panic!("expected list");
        };
        assert!(list.sort.is_none());
        assert_eq!(list.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_export() {
        let args = vec!["avgang", "export", "-f", "csv", "-o", "/tmp/out.csv"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Registry(RegistryCommand::Export(export)) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(export.format, ExportFormatArg::Csv);
        assert_eq!(export.output, Some(PathBuf::from("/tmp/out.csv")));

        assert!(Cli::try_parse_from(vec!["avgang", "export"]).is_err());
    }

    #[test]
    fn test_parse_import() {
        let args = vec!["avgang", "import", "backup.json", "--policy", "replace", "-y"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Registry(RegistryCommand::Import(import)) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(import.file, PathBuf::from("backup.json"));
        assert_eq!(import.policy, Some(PolicyArg::Replace));
        assert!(import.yes);
    }

    #[test]
    fn test_parse_clear_and_seed() {
        let cli = Cli::try_parse_from(vec!["avgang", "clear", "-y"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Registry(RegistryCommand::Clear { yes: true })
        ));

        let cli = Cli::try_parse_from(vec!["avgang", "seed"]).unwrap();
        assert!(matches!(cli.command, Command::Registry(RegistryCommand::Seed)));
    }

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(vec!["avgang", "config", "show", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Show { json: true })
        ));

        let cli = Cli::try_parse_from(vec!["avgang", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }

    #[test]
    fn test_registry_commands_stay_top_level() {
        let mut names: Vec<String> = Cli::command()
            .get_subcommands()
            .map(|sub| sub.get_name().to_string())
            .filter(|name| name != "help")
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "add", "clear", "config", "delete", "edit", "export", "import", "list", "seed",
                "stats"
            ]
        );
        assert!(Cli::try_parse_from(vec!["avgang", "registry", "seed"]).is_err());
    }

    #[test]
    fn test_parse_with_global_flags() {
        let args = vec!["avgang", "-c", "/custom/config.toml", "-vv", "stats", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Registry(RegistryCommand::Stats(StatsCommand { json: true, .. }))
        ));
    }

    #[test]
    fn test_parse_with_quiet() {
        let cli = Cli::try_parse_from(vec!["avgang", "-q", "list"]).unwrap();
        assert!(cli.quiet);
    }
}
