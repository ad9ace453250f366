pub mod onboard;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "commit-diary",
    about = "Turns a repository's commit history into an AI-written daily report"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive first-time setup
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Check configuration and credentials
    Doctor,
    /// Serve the HTTP API
    Serve,
    /// Fetch commits and write them to a JSON file
    Fetch {
        /// Only keep commits authored on this day (YYYY-MM-DD)
        #[arg(long, conflicts_with = "today")]
        date: Option<String>,
        /// Only keep commits authored today
        #[arg(long, default_value_t = false)]
        today: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a daily report from commits
    Report {
        /// Only report on commits authored on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum AiCommands {
    Test {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}
