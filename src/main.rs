//! # td - taskdesk command line
//!
//! Manage tasks and projects stored in a local SQLite file, export and import
//! the whole dataset as JSON, and chart progress in the terminal.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a project and a task in it
//! td project add "Launch" --due "end of month"
//! td add "Write spec" --priority high --project 1 --category docs
//!
//! # Work through it
//! td start 1
//! td complete 1
//!
//! # See where things stand
//! td list --status todo --sort priority
//! td project list
//! td stats
//!
//! # Move data around
//! td export -o tasks.json
//! td import tasks.json
//! ```
//!
//! Data is stored in `~/.taskdesk/taskdesk.db` unless `--db`, `TASKDESK_DB`
//! or the `database` key of `~/.taskdesk/config.toml` says otherwise.
//! Backups are written to a `backup/` directory next to the database.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskdesk::config::Config;
use taskdesk::{Database, Status};

mod cli;
mod cmd;
mod display;

use cli::Cli;
use cmd::*;

fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        let user_error = e
            .downcast_ref::<taskdesk::Error>()
            .is_some_and(taskdesk::Error::is_user_error);
        std::process::exit(if user_error { 1 } else { 2 });
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config);

    let db_path = config.database_path(cli.db.as_deref())?;
    let mut db = Database::open(&db_path)?;

    match cli.command {
        Commands::Add { title, desc, category, priority, status, due, project } => {
            cmd_add(&mut db, &config, title, desc, category, priority, status, due, project)
        }

        Commands::List { status, priority, project, category, search, due, sort, limit } => {
            cmd_list(&db, &config, status, priority, project, category, search, due, sort, limit)
        }

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update {
            id, title, desc, category, priority, status, due, project, clear_due, clear_project,
        } => cmd_update(
            &mut db, id, title, desc, category, priority, status, due, project, clear_due,
            clear_project,
        ),

        Commands::Start { id } => cmd_set_status(&mut db, id, Status::InProgress),

        Commands::Complete { id } => cmd_set_status(&mut db, id, Status::Completed),

        Commands::Reopen { id } => cmd_set_status(&mut db, id, Status::Todo),

        Commands::Delete { id } => cmd_delete(&mut db, id),

        Commands::Project { action } => cmd_project(&mut db, action),

        Commands::Stats { json } => cmd_stats(&db, json),

        Commands::Export { output } => cmd_export(&db, output),

        Commands::Import { input, no_backup } => cmd_import(&mut db, input, no_backup),

        Commands::Backup => cmd_backup(&db),

        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Logs go to stderr so table output stays pipeable. `RUST_LOG` wins over the
/// config file, which wins over the built-in default.
fn init_tracing(verbose: bool, config: &Config) {
    let default = if verbose {
        "taskdesk=debug,td=debug".to_string()
    } else {
        config.log_filter.clone().unwrap_or_else(|| "taskdesk=warn,td=warn".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
