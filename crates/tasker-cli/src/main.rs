//! Tasker CLI
//!
//! Command-line interface for Tasker - local task tracking.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tasker_core::{Config, Database, TaskFilter};

mod commands;
mod output;
mod prompt;

use commands::task::TaskFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "tasker")]
#[command(about = "Tasker - Local task tracking")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database (first-time setup)
    Init,
    /// Create a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: String,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Which tasks to show (all, pending, completed)
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Edit a task (prompts for each field when no flags are given)
    Edit {
        /// Task ID
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// Mark a task completed
    Done {
        /// Task ID
        id: String,
    },
    /// Mark a task pending again
    Undo {
        /// Task ID
        id: String,
    },
    /// Flip a task between completed and pending
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the five newest high-priority pending tasks
    Top,
    /// Delete completed tasks not updated for a number of days
    Purge {
        /// Age threshold in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,
        /// Undo every deletion if any one fails
        #[arg(long)]
        atomic: bool,
    },
    /// Show task counts and storage details
    #[command(alias = "status")]
    Stats,
    /// Export the database as JSON
    Export {
        /// Write `task_database_<ms>.json` into this directory instead of stdout
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Replace the database with an exported JSON file
    Import {
        /// File produced by `export`
        file: PathBuf,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Export tasks as XML
    Xml {
        /// Which tasks to export (all, pending, completed)
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore the snapshot left by an interrupted transaction
    Rollback,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Optional task fields shared by `add` and `edit`
#[derive(clap::Args)]
struct DetailArgs {
    /// Description
    #[arg(short = 'D', long)]
    description: Option<String>,
    /// Priority (low, medium, high)
    #[arg(short, long)]
    priority: Option<String>,
    /// Category
    #[arg(short, long)]
    category: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    due: Option<String>,
}

impl DetailArgs {
    fn into_fields(self, title: Option<String>) -> TaskFields {
        TaskFields {
            title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            due: self.due,
        }
    }
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, log_level, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands must work even when the current config is unusable
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    if let Commands::Init = cli.command {
        return commands::status::init(&config, output);
    }

    let mut db = Database::open_with_config(&config)?;
    debug!("Opened database on {} backend", db.backend_name());

    if !matches!(cli.command, Commands::Rollback) && db.has_pending_transaction()? {
        output.warn(
            "A transaction snapshot was left behind by an interrupted run. \
             Run `tasker rollback` to restore it.",
        );
    }

    match cli.command {
        Commands::Init | Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Add { title, details } => {
            commands::task::add(&mut db, details.into_fields(Some(title)), output)
        }
        Commands::List { filter } => commands::task::list(&db, filter, output),
        Commands::Show { id } => commands::task::show(&db, id, output),
        Commands::Edit { id, title, details } => {
            commands::task::edit(&mut db, id, details.into_fields(title), output)
        }
        Commands::Done { id } => commands::task::set_status(&mut db, id, true, output),
        Commands::Undo { id } => commands::task::set_status(&mut db, id, false, output),
        Commands::Toggle { id } => commands::task::toggle(&mut db, id, output),
        Commands::Delete { id, yes } => commands::task::delete(&mut db, id, yes, output),
        Commands::Top => commands::task::top(&db, output),
        Commands::Purge { days, atomic } => commands::data::purge(&mut db, days, atomic, output),
        Commands::Stats => commands::status::stats(&db, &config, output),
        Commands::Export { dir } => commands::data::export(&db, dir, output),
        Commands::Import { file, yes } => commands::data::import(&mut db, file, yes, output),
        Commands::Xml { filter, output: file } => commands::data::xml(&db, filter, file, output),
        Commands::Rollback => commands::data::rollback(&mut db, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize file-based logging
///
/// Logs go to `config.log_file` or `<data_dir>/tasker.log`, filtered at
/// `config.log_level` (overridable with TASKER_LOG_LEVEL).
fn init_logging(config: &Config) {
    let log_path = config.log_path();

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let level = &config.log_level;
    let env_filter = EnvFilter::new(format!("tasker_core={},tasker_cli={}", level, level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_details() {
        let cli = Cli::try_parse_from([
            "tasker", "--json", "add", "Write report", "-p", "high", "--due", "2030-01-01",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Add { title, details } => {
                let fields = details.into_fields(Some(title));
                assert_eq!(fields.title.as_deref(), Some("Write report"));
                assert_eq!(fields.priority.as_deref(), Some("high"));
                assert_eq!(fields.due.as_deref(), Some("2030-01-01"));
                assert!(fields.category.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_list_filter() {
        let cli = Cli::try_parse_from(["tasker", "ls", "--filter", "pending"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                filter: TaskFilter::Pending
            }
        ));

        assert!(Cli::try_parse_from(["tasker", "list", "--filter", "someday"]).is_err());
    }

    #[test]
    fn test_parse_purge_defaults() {
        let cli = Cli::try_parse_from(["tasker", "purge", "--atomic"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Purge {
                days: 30,
                atomic: true
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tasker", "stats", "-q", "--config", "/tmp/t.toml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
    }
}
