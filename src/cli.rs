use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Local task and project manager.
/// Storage defaults to ~/.taskdesk/taskdesk.db or a path passed via --db.
#[derive(Parser)]
#[command(name = "td", version, about = "Local task and project manager")]
pub struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, global = true, env = "TASKDESK_DB")]
    pub db: Option<PathBuf>,

    /// Path to a config file (default: ~/.taskdesk/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
