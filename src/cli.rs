//! Command-line argument parsing for billing-digest.
//!
//! Target identifiers come from the environment; the command line only chooses
//! between a single run and serving the HTTP trigger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Posts yesterday's BigQuery billing totals to a Google Chat webhook.
#[derive(Parser, Debug)]
#[command(name = "billing-digest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Load environment variables from this file before reading configuration
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "debug", "billing_digest=trace")
    #[arg(long, value_name = "FILTER", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the digest once and exit (default)
    Run,
    /// Serve the HTTP trigger; every request to / runs the digest
    Serve {
        /// Address to listen on
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen: String,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the command to execute, defaulting to a single run.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Loads the `.env` file: the one given with `--env-file`, or `./.env` if present.
    ///
    /// Variables already set in the environment are not overridden.
    pub fn load_env_file(&self) -> Result<Option<PathBuf>, dotenvy::Error> {
        match &self.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| Some(path.clone())),
            None => match dotenvy::dotenv() {
                Ok(path) => Ok(Some(path)),
                Err(e) if e.not_found() => Ok(None),
                Err(e) => Err(e),
            },
        }
    }
}
